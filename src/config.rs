use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::llm::api_key::ApiKey;
use crate::pipeline::archive::DEFAULT_MAX_EXTRACTED_BYTES;

/// Per-repo config file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "skill2cmd.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub compile: CompileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// gemini, anthropic, openai or openai-compatible
    pub provider: String,
    pub model: String,
    /// Variable holding the API key; "none" disables it. When unset the
    /// provider's own variable is used (see [`LlmConfig::key_env_var`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,

    /// Optional: Override max_tokens for LLM requests
    /// If not specified, uses provider-specific defaults:
    /// - gemini: 65536
    /// - anthropic: 16384
    /// - openai: 16384
    /// - openai-compatible: 16384
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds for the single compile call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

impl LlmConfig {
    /// Get max_tokens value, using provider-specific default if not specified.
    /// Compiled prompts inline every resource, so defaults are generous.
    pub fn get_max_tokens(&self) -> u32 {
        if let Some(tokens) = self.max_tokens {
            return tokens;
        }

        match self.provider.as_str() {
            "gemini" => 65536,
            "anthropic" => 16384,
            "openai" => 16384,
            "openai-compatible" => 16384,
            _ => 8192,
        }
    }

    /// Environment variable the credential is read from.
    ///
    /// An explicit `api_key_env` wins. Otherwise each hosted provider has its
    /// own variable so a key is never sent to a different vendor, and
    /// `openai-compatible` takes none.
    pub fn key_env_var(&self) -> Option<String> {
        match &self.api_key_env {
            Some(var) if var.eq_ignore_ascii_case("none") => None,
            Some(var) => Some(var.clone()),
            None => provider_key_env(&self.provider).map(str::to_string),
        }
    }

    /// Read the credential from the environment.
    ///
    /// A missing variable yields an absent key rather than an error: the
    /// client reports it when the request is made.
    pub fn resolve_api_key(&self) -> ApiKey {
        match self.key_env_var() {
            Some(var) => {
                let key = env::var(&var).unwrap_or_default();
                if key.is_empty() {
                    debug!("Environment variable {} is not set", var);
                }
                ApiKey::new(key)
            }
            None => ApiKey::default(),
        }
    }
}

/// Conventional key variable for a provider.
pub fn provider_key_env(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some("GEMINI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Upper bound on the input archive size, checked before it is read
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,

    /// Upper bound on the total decompressed size of the archive's entries
    #[serde(default = "default_max_extracted_bytes")]
    pub max_extracted_bytes: u64,

    /// Directory the output archive is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_max_archive_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_max_extracted_bytes() -> u64 {
    DEFAULT_MAX_EXTRACTED_BYTES
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_archive_bytes: default_max_archive_bytes(),
            max_extracted_bytes: default_max_extracted_bytes(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path);
        }

        if Path::new(LOCAL_CONFIG_FILE).exists() {
            debug!("Loading config from ./{}", LOCAL_CONFIG_FILE);
            return Self::load_from_path(LOCAL_CONFIG_FILE);
        }

        if let Some(config_path) = Self::user_config_path() {
            if config_path.exists() {
                debug!("Loading config from {:?}", config_path);
                return Self::load_from_path(&config_path);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    /// `<config dir>/skill2cmd/config.toml`, if the platform has a config dir.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skill2cmd").join("config.toml"))
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: "gemini".to_string(),
                model: "gemini-2.5-pro".to_string(),
                api_key_env: None,
                base_url: None,
                max_tokens: None,
                timeout_secs: default_timeout_secs(),
            },
            compile: CompileConfig::default(),
        }
    }
}
