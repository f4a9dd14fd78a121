//! Chat orchestration around the knowledge retriever
//!
//! This module provides:
//! - Conversation message types and history
//! - The `TextGenerator` seam for the external language model
//! - Keyword-based fallback replies for when the model is unreachable
//! - `ChatService`, which ties retrieval, prompting and generation together

mod conversation;
mod fallback;
mod generator;
mod service;
mod types;

pub use conversation::Conversation;
pub use fallback::{CANNED_REPLIES, FallbackResponder};
pub use generator::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, GenerationOptions, OfflineGenerator, TextGenerator,
};
pub use service::{ChatService, DEFAULT_HISTORY_LIMIT};
pub use types::{Message, MessageRole, Reply, ReplySource};
