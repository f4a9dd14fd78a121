//! Environment diagnostics
//!
//! A redacted snapshot of the settings the model service depends on, for
//! answering "why is the concierge stuck in offline mode?".

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{API_KEY_ENV, redact_key};

/// Expected shape of a valid API key
pub const EXPECTED_KEY_FORMAT: &str = "sk-ant-...";

/// Variable names containing any of these are never listed
const SENSITIVE_MARKERS: [&str; 4] = ["SECRET", "TOKEN", "KEY", "PASSWORD"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub api_key_configured: bool,
    pub api_key_prefix: String,
    pub api_key_length: usize,
    pub expected_key_format: String,
    /// Names of non-sensitive environment variables, sorted
    pub env_vars: Vec<String>,
}

impl Diagnostics {
    /// Snapshot of the current process environment
    pub fn collect() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Snapshot built from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut api_key = None;
        let mut env_vars = Vec::new();

        for (name, value) in vars {
            let name = name.into();
            if name == API_KEY_ENV {
                let value: String = value.into();
                if !value.trim().is_empty() {
                    api_key = Some(value);
                }
            }
            if !SENSITIVE_MARKERS.iter().any(|m| name.contains(m)) {
                env_vars.push(name);
            }
        }
        env_vars.sort();

        Self {
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            api_key_configured: api_key.is_some(),
            api_key_prefix: api_key
                .as_deref()
                .map(redact_key)
                .unwrap_or_else(|| "NOT SET".to_string()),
            api_key_length: api_key.as_ref().map(|k| k.len()).unwrap_or(0),
            expected_key_format: EXPECTED_KEY_FORMAT.to_string(),
            env_vars,
        }
    }

    /// True when the key is present and looks like the expected format
    pub fn api_key_looks_valid(&self) -> bool {
        self.api_key_configured && self.api_key_prefix.starts_with("sk-ant-")
    }
}
