//! Shared helpers for provider implementations.

pub mod sse;

pub use sse::{decode_frames, llm_stream_from_sse, stream_from_frames, FrameStream, SseFrame};
