//! Configuration management
//!
//! Settings are resolved in the following order:
//! 1. Environment variables
//! 2. `chatai.toml` configuration file
//! 3. Default values
//!
//! Inside the configuration file, `${VAR_NAME}` is expanded from the
//! environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Error;

/// Default config file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "chatai.toml";

/// Generative-language API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key, sent as the `key` query parameter
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the v1beta API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

/// Where the history key-value surface lives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One file per key inside a directory
    #[default]
    File,
    /// A single `kv` table in a SQLite database
    Sqlite,
    /// Process-local; nothing survives a restart
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "file" | "fs" => Some(Self::File),
            "sqlite" | "db" => Some(Self::Sqlite),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory (file backend) or database file (sqlite backend)
    pub path: Option<String>,
}

impl StorageConfig {
    /// The configured path, or the backend's default location
    pub fn effective_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(path),
            None => match self.backend {
                StorageBackend::Sqlite => PathBuf::from("data/chatai.db"),
                StorageBackend::File | StorageBackend::Memory => PathBuf::from("data/chatai"),
            },
        }
    }
}

/// Main configuration for chatai
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Expand `${VAR_NAME}` references from the environment.
    ///
    /// Unknown variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Parse TOML text (with `${VAR}` expansion) without looking at overrides
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded_content = Self::expand_env_vars(content);

        let config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        Self::from_toml_config(config)
    }

    /// Load from `./chatai.toml` when present, otherwise from the environment only
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn from_toml_config(toml: TomlConfig) -> crate::Result<Self> {
        let llm = toml.llm.unwrap_or_default();
        let llm_config = LlmConfig {
            api_key: llm.api_key.unwrap_or_default(),
            model: llm.model.unwrap_or_else(default_model),
            base_url: llm.base_url.unwrap_or_else(default_base_url),
            timeout_secs: llm.timeout_secs.unwrap_or_else(default_timeout_secs),
        };

        let storage = toml.storage.unwrap_or_default();
        let backend = match storage.backend {
            Some(name) => StorageBackend::parse(&name)
                .ok_or_else(|| Error::Config(format!("Unknown storage backend: {}", name)))?,
            None => StorageBackend::default(),
        };

        Ok(Config {
            llm: llm_config,
            storage: StorageConfig {
                backend,
                path: storage.path,
            },
        })
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields from a variable lookup; empty values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(api_key) = get("GEMINI_API_KEY").or_else(|| get("LLM_API_KEY")) {
            self.llm.api_key = api_key;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = get("LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(secs) = get("LLM_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.llm.timeout_secs = secs;
        }

        if let Some(backend) = get("STORAGE_BACKEND") {
            match StorageBackend::parse(&backend) {
                Some(b) => self.storage.backend = b,
                None => tracing::warn!("Ignoring unknown STORAGE_BACKEND: {}", backend),
            }
        }
        if let Some(path) = get("STORAGE_PATH") {
            self.storage.path = Some(path);
        }
    }

    /// Check that everything needed to reach the answer service is present
    pub fn validate(&self) -> crate::Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(Error::Config(
                "GEMINI_API_KEY (or LLM_API_KEY) is not set".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    llm: Option<TomlLlmConfig>,
    storage: Option<TomlStorageConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLlmConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlStorageConfig {
    /// "file", "sqlite" or "memory"
    #[serde(default)]
    backend: Option<String>,
    #[serde(default)]
    path: Option<String>,
}
