//! Concierge Core Library
//!
//! This crate provides the core functionality for the clinic concierge,
//! including:
//! - Knowledge collection and lexical retrieval
//! - Context rendering and system prompt assembly
//! - Chat orchestration with local fallback replies
//! - Configuration and environment diagnostics

pub mod chat;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod knowledge;

pub use error::{Error, Result, ServiceError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chat::{ChatService, Conversation, Message, Reply, TextGenerator};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result, ServiceError};
    pub use crate::knowledge::{KnowledgeBase, KnowledgeEntry, Retriever, ScoringVariant};
}
