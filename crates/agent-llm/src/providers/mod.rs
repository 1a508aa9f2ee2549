//! LLM Providers
//!
//! A single HTTP provider covers both wire formats; the format only changes how the
//! request is built and how records are read back.

pub mod common;
pub mod http;

pub use http::HttpProvider;
