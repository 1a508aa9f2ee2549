pub mod json;

pub use json::{JsonStorage, Storage, StoredConversation};
