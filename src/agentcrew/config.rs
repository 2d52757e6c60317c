//! Settings for a chat front end.
//!
//! [`CrewConfig`] gathers what the chat sidebar lets a user choose (two system prompts,
//! the model and the memory window) plus the API key and where artifacts are written.
//!
//! ```rust
//! use agentcrew::config::CrewConfig;
//!
//! let config = CrewConfig::default();
//! assert_eq!(config.primary_prompt, "Como posso ajudar você hoje?");
//! assert_eq!(config.memory_window, 5);
//! assert!(config.validate().is_ok());
//! ```

use crate::clients::groq::{GroqClient, Model};
use crate::prompt_selector::PromptSelector;
use crate::session::{Session, MAX_MEMORY_WINDOW, MIN_MEMORY_WINDOW};
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the Groq API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";
/// Optional environment override for the model.
pub const MODEL_ENV: &str = "AGENTCREW_MODEL";
/// Optional environment override for the memory window.
pub const MEMORY_WINDOW_ENV: &str = "AGENTCREW_MEMORY_WINDOW";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey,
    Io { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    InvalidModel(String),
    InvalidMemoryWindow(String),
    EmptyPrompt(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => write!(f, "No API key configured ({})", API_KEY_ENV),
            ConfigError::Io { path, message } => {
                write!(f, "Could not read {}: {}", path.display(), message)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "Could not parse {}: {}", path.display(), message)
            }
            ConfigError::InvalidModel(msg) => write!(f, "Invalid model: {}", msg),
            ConfigError::InvalidMemoryWindow(value) => write!(
                f,
                "Memory window must be between {} and {}, got {}",
                MIN_MEMORY_WINDOW, MAX_MEMORY_WINDOW, value
            ),
            ConfigError::EmptyPrompt(which) => write!(f, "The {} prompt is empty", which),
        }
    }
}

impl Error for ConfigError {}

/// Chat settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewConfig {
    pub api_key: Option<String>,
    pub primary_prompt: String,
    pub secondary_prompt: String,
    pub model: Model,
    /// Turns replayed to the model, `1..=50`.
    pub memory_window: usize,
    /// Directory receiving task `output_file` artifacts.
    pub artifacts_dir: PathBuf,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            primary_prompt: "Como posso ajudar você hoje?".to_string(),
            secondary_prompt: "Há algo mais em que posso ajudar?".to_string(),
            model: Model::Llama3_70b8192,
            memory_window: 5,
            artifacts_dir: PathBuf::from("."),
        }
    }
}

/// Layout of `secrets.toml`. Only the key is required.
#[derive(Deserialize)]
struct SecretsFile {
    #[serde(rename = "GROQ_API_KEY")]
    groq_api_key: String,
    model: Option<String>,
    memory_window: Option<usize>,
    primary_prompt: Option<String>,
    secondary_prompt: Option<String>,
    artifacts_dir: Option<PathBuf>,
}

impl CrewConfig {
    /// Defaults plus the key (and optional overrides) from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = CrewConfig {
            api_key: Some(api_key),
            ..CrewConfig::default()
        };
        if let Ok(model) = std::env::var(MODEL_ENV) {
            config.model = parse_model(&model)?;
        }
        if let Ok(window) = std::env::var(MEMORY_WINDOW_ENV) {
            config.memory_window = window
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidMemoryWindow(window.clone()))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load a `secrets.toml` holding `GROQ_API_KEY = "..."` and, optionally, `model`,
    /// `memory_window`, `primary_prompt`, `secondary_prompt` and `artifacts_dir`.
    pub fn from_secrets_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let secrets: SecretsFile = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let defaults = CrewConfig::default();
        let config = CrewConfig {
            api_key: Some(secrets.groq_api_key),
            primary_prompt: secrets.primary_prompt.unwrap_or(defaults.primary_prompt),
            secondary_prompt: secrets.secondary_prompt.unwrap_or(defaults.secondary_prompt),
            model: match secrets.model {
                Some(model) => parse_model(&model)?,
                None => defaults.model,
            },
            memory_window: secrets.memory_window.unwrap_or(defaults.memory_window),
            artifacts_dir: secrets.artifacts_dir.unwrap_or(defaults.artifacts_dir),
        };
        config.validate()?;
        log::debug!("CrewConfig::from_secrets_file(): loaded {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_prompt.trim().is_empty() {
            return Err(ConfigError::EmptyPrompt("primary"));
        }
        if self.secondary_prompt.trim().is_empty() {
            return Err(ConfigError::EmptyPrompt("secondary"));
        }
        if !(MIN_MEMORY_WINDOW..=MAX_MEMORY_WINDOW).contains(&self.memory_window) {
            return Err(ConfigError::InvalidMemoryWindow(
                self.memory_window.to_string(),
            ));
        }
        if matches!(&self.api_key, Some(key) if key.trim().is_empty()) {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    pub fn prompt_selector(&self) -> PromptSelector {
        PromptSelector::new(&self.primary_prompt, &self.secondary_prompt)
    }

    /// A fresh session using the configured memory window.
    pub fn new_session(&self) -> Result<Session, ConfigError> {
        Session::new(self.memory_window)
            .map_err(|e| ConfigError::InvalidMemoryWindow(e.0.to_string()))
    }

    pub fn groq_client(&self) -> Result<GroqClient, ConfigError> {
        let key = self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)?;
        Ok(GroqClient::new_with_model_enum(key, self.model))
    }
}

fn parse_model(name: &str) -> Result<Model, ConfigError> {
    name.trim().parse().map_err(ConfigError::InvalidModel)
}
