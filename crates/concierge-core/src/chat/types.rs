//! Conversation message types

use serde::{Deserialize, Serialize};

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The patient / end user
    User,
    /// The concierge's reply
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// Generated by the text-generation service
    Model,
    /// Local canned reply used because the service failed
    Fallback,
    /// The service is misconfigured; the reply describes the problem
    ConfigurationError,
}

/// Reply produced for one user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Text to display
    pub text: String,
    /// Text to speak; omits diagnostic notices shown on screen
    pub spoken: String,
    pub source: ReplySource,
    /// Ids of the knowledge entries placed in the prompt
    pub knowledge_ids: Vec<u32>,
}

impl Reply {
    pub fn is_fallback(&self) -> bool {
        self.source != ReplySource::Model
    }
}
