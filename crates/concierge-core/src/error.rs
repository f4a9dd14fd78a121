//! Error types for Concierge

use thiserror::Error;

/// Result type alias using Concierge's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Concierge error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Knowledge errors (E001-E099)
    #[error("Invalid knowledge collection: {0}")]
    InvalidKnowledge(String),

    #[error("Knowledge entry {0} not found. Run `concierge knowledge list` to see all entries.")]
    KnowledgeNotFound(u32),

    #[error("Failed to parse knowledge file: {0}")]
    KnowledgeLoad(#[from] toml::de::Error),

    // Text generation errors (E100-E199)
    #[error(transparent)]
    Service(#[from] ServiceError),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKnowledge(_) => "E001",
            Self::KnowledgeNotFound(_) => "E002",
            Self::KnowledgeLoad(_) => "E003",
            Self::Service(e) => e.code(),
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidKnowledge(_) | Self::KnowledgeLoad(_) => {
                Some("concierge knowledge validate".to_string())
            }
            Self::KnowledgeNotFound(_) => Some("concierge knowledge list".to_string()),
            Self::Service(e) => e.suggestion(),
            Self::ConfigError(_) => Some("concierge config list".to_string()),
            _ => None,
        }
    }
}

/// Failures reported by the external text-generation service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("API key not configured. Set the ANTHROPIC_API_KEY environment variable.")]
    MissingApiKey,

    #[error("Invalid API key. Check the value of ANTHROPIC_API_KEY.")]
    InvalidApiKey,

    #[error("API rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response from text generation service: {0}")]
    MalformedResponse(String),

    #[error("Text generation service unavailable")]
    Unavailable,

    #[error("Text generation failed: {0}")]
    Other(String),
}

impl ServiceError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "E100",
            Self::InvalidApiKey => "E101",
            Self::RateLimited => "E102",
            Self::Network(_) => "E103",
            Self::MalformedResponse(_) => "E104",
            Self::Unavailable => "E105",
            Self::Other(_) => "E199",
        }
    }

    /// True when the failure can only be fixed by changing configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::InvalidApiKey)
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingApiKey | Self::InvalidApiKey => Some("concierge doctor".to_string()),
            Self::Network(_) => Some("Check internet connection".to_string()),
            _ => None,
        }
    }
}
