//! Text generation seam
//!
//! The hosted language model is an external collaborator. Anything that can
//! turn a system prompt, prior turns and a new message into reply text can
//! stand behind [`TextGenerator`].

use async_trait::async_trait;

use crate::error::ServiceError;

use super::types::Message;

/// Model requested when none is configured
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Reply length cap when none is configured
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// Model selection and output budget forwarded with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub model: String,
    pub max_tokens: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// External text-generation service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a reply to `message` given instructions and prior turns
    async fn generate(
        &self,
        options: &GenerationOptions,
        system: &str,
        history: &[Message],
        message: &str,
    ) -> Result<String, ServiceError>;
}

/// Generator used when no model service is wired in
///
/// Always reports the service as unavailable, so every reply comes from the
/// local fallback responder.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(
        &self,
        _options: &GenerationOptions,
        _system: &str,
        _history: &[Message],
        _message: &str,
    ) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}
