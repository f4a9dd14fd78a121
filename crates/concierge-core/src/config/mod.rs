//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::chat::{DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, GenerationOptions};
use crate::context::{ContextFormat, DEFAULT_PERSONA, DEFAULT_STYLE_GUIDANCE, PromptBuilder};
use crate::knowledge::{DEFAULT_TOP_K, KnowledgeBase, Retriever, ScoringVariant};

/// Environment variable holding the model service API key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "CONCIERGE_CONFIG_DIR";

/// Concierge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retrieval: RetrievalConfig,
    pub knowledge: KnowledgeConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub variant: ScoringVariant,
    pub top_k: usize,
    pub context_format: ContextFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// TOML knowledge file; the built-in table is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub history_limit: usize,
    pub persona: String,
    pub style_guidance: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            variant: ScoringVariant::Keyword,
            top_k: DEFAULT_TOP_K,
            context_format: ContextFormat::Bulleted,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            persona: DEFAULT_PERSONA.to_string(),
            style_guidance: DEFAULT_STYLE_GUIDANCE.to_string(),
        }
    }
}

impl ChatConfig {
    /// Model and output budget to request from the generator
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
        }
    }

    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;

        Ok(env::var(API_KEY_ENV)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()))
    }

    pub fn redacted_api_key(&self) -> anyhow::Result<Option<String>> {
        self.resolved_api_key().map(|opt| opt.map(|key| redact_key(&key)))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "API keys must be provided via the {} environment variable, not stored in configuration",
                API_KEY_ENV
            ));
        }
        Ok(())
    }
}

/// First 7 characters of a key followed by `...`
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(7).collect();
    format!("{}...", prefix)
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("concierge")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.chat.enforce_env_only()?;
        if self.retrieval.top_k == 0 {
            return Err(anyhow!("retrieval.top_k must be at least 1"));
        }
        if self.chat.history_limit == 0 {
            return Err(anyhow!("chat.history_limit must be at least 1"));
        }
        if self.chat.max_tokens == 0 {
            return Err(anyhow!("chat.max_tokens must be at least 1"));
        }
        Ok(())
    }

    /// Build the knowledge collection this configuration points at
    pub fn load_knowledge(&self) -> anyhow::Result<KnowledgeBase> {
        match &self.knowledge.path {
            Some(path) => KnowledgeBase::load(path)
                .with_context(|| format!("Failed to load knowledge file: {}", path.display())),
            None => KnowledgeBase::builtin().context("Built-in knowledge table is invalid"),
        }
    }

    /// Build a retriever over the configured collection
    pub fn build_retriever(&self) -> anyhow::Result<Retriever> {
        let knowledge = Arc::new(self.load_knowledge()?);
        Ok(Retriever::new(knowledge, self.retrieval.variant).with_top_k(self.retrieval.top_k))
    }

    pub fn build_prompt(&self) -> PromptBuilder {
        PromptBuilder::new(
            self.chat.persona.clone(),
            self.chat.style_guidance.clone(),
            self.retrieval.context_format,
        )
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Retrieval settings
            "retrieval.variant" => Ok(self.retrieval.variant.to_string()),
            "retrieval.top_k" => Ok(self.retrieval.top_k.to_string()),
            "retrieval.context_format" => Ok(self.retrieval.context_format.to_string()),

            // Knowledge settings
            "knowledge.path" => Ok(self
                .knowledge
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())),

            // Chat settings
            "chat.model" => Ok(self.chat.model.clone()),
            "chat.max_tokens" => Ok(self.chat.max_tokens.to_string()),
            "chat.history_limit" => Ok(self.chat.history_limit.to_string()),
            "chat.persona" => Ok(self.chat.persona.clone()),
            "chat.style_guidance" => Ok(self.chat.style_guidance.clone()),

            // API key (special handling - show redacted)
            "chat.api_key" | "api_key" => match self.chat.redacted_api_key()? {
                Some(redacted) => Ok(redacted),
                None => Ok(format!("(not set - use {} env var)", API_KEY_ENV)),
            },

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `concierge config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "retrieval.variant" => {
                self.retrieval.variant = value.parse()?;
            }
            "retrieval.top_k" => {
                let top_k: usize = value
                    .parse()
                    .with_context(|| format!("Invalid top_k value: {}", value))?;
                if top_k == 0 {
                    return Err(anyhow!("top_k must be at least 1"));
                }
                self.retrieval.top_k = top_k;
            }
            "retrieval.context_format" => {
                self.retrieval.context_format = value.parse()?;
            }

            "knowledge.path" => {
                let value = value.trim();
                self.knowledge.path = if value.is_empty() || value == "builtin" {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }

            "chat.model" => {
                self.chat.model = value.to_string();
            }
            "chat.max_tokens" => {
                let max_tokens: usize = value
                    .parse()
                    .with_context(|| format!("Invalid max_tokens value: {}", value))?;
                if max_tokens == 0 {
                    return Err(anyhow!("max_tokens must be at least 1"));
                }
                self.chat.max_tokens = max_tokens;
            }
            "chat.history_limit" => {
                let limit: usize = value
                    .parse()
                    .with_context(|| format!("Invalid history_limit value: {}", value))?;
                if limit == 0 {
                    return Err(anyhow!("history_limit must be at least 1"));
                }
                self.chat.history_limit = limit;
            }
            "chat.persona" => {
                self.chat.persona = value.to_string();
            }
            "chat.style_guidance" => {
                self.chat.style_guidance = value.to_string();
            }

            // API key cannot be set via config
            "chat.api_key" | "api_key" => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration for security. \
                     Set the {} environment variable instead.",
                    API_KEY_ENV
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `concierge config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "retrieval.variant",
            "retrieval.top_k",
            "retrieval.context_format",
            "knowledge.path",
            "chat.model",
            "chat.max_tokens",
            "chat.history_limit",
            "chat.persona",
            "chat.style_guidance",
            "chat.api_key",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
