//! Configuration management
//!
//! This module handles loading, validation, and management of the tutor configuration.
//! Configuration is stored in TOML format at ~/.tutor/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **server**: Bind address and CORS
//! - **llm**: Provider selection, timeouts, retries and per-provider settings
//! - **quiz**: Target language and prompt overrides
//! - **store**: Thread storage backend
//!
//! # Path Expansion
//!
//! Paths starting with `~` are expanded to the user's home directory and the
//! data directory is created when missing.
//!
//! # Examples
//!
//! ```no_run
//! use tutor_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Provider: {}", config.llm.provider);
//! println!("Language: {}", config.quiz.language);
//! # Ok(())
//! # }
//! ```

use sdk::errors::TutorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Quiz content settings
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Thread store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the chat endpoint listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Allow cross-origin requests from any origin
    #[serde(default)]
    pub cors: bool,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Active provider (gemini, ollama)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after a transient provider failure (0 disables retrying)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further attempt
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Gemini provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Environment variable holding the API key
    #[serde(default = "default_gemini_api_key_env")]
    pub api_key_env: String,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// Quiz content configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Language the questions are asked in
    #[serde(default = "default_language")]
    pub language: String,

    /// Replaces the built-in system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Replaces the request sent when a thread starts with no history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_request: Option<String>,

    /// Replaces the built-in evaluation instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_prompt: Option<String>,
}

/// Thread store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage backend (memory, sqlite)
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (supports ~ expansion)
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.tutor")
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_gemini_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_language() -> String {
    "Czech".to_string()
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("~/.tutor/threads.db")
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            temperature: 0.0,
            api_key_env: default_gemini_api_key_env(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            system_prompt: None,
            opening_request: None,
            evaluation_prompt: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.tutor/config.toml)
    ///
    /// If the configuration file doesn't exist, writes a default configuration
    /// there first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, TOML parsing
    /// fails, or validation fails.
    pub fn load_or_create() -> Result<Self, TutorError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, TutorError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| TutorError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, TutorError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| TutorError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, TutorError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TutorError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable ~ paths
        let config = Self::default();
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| TutorError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| TutorError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Wrote default configuration to {}", path.display());

        let mut config = config;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.tutor/config.toml)
    fn default_config_path() -> Result<PathBuf, TutorError> {
        let home = dirs::home_dir()
            .ok_or_else(|| TutorError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".tutor").join("config.toml"))
    }

    /// Parsed server bind address
    pub fn bind_addr(&self) -> Result<SocketAddr, TutorError> {
        self.server.bind.parse().map_err(|e| {
            TutorError::Config(format!("Invalid bind address '{}': {}", self.server.bind, e))
        })
    }

    /// Validate and process configuration
    ///
    /// Checks enumerated values and ranges, expands ~ in paths and creates
    /// the data directory.
    fn validate_and_process(&mut self) -> Result<(), TutorError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(TutorError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_providers = ["gemini", "ollama"];
        if !valid_providers.contains(&self.llm.provider.as_str()) {
            return Err(TutorError::Config(format!(
                "Invalid provider '{}'. Must be one of: {}",
                self.llm.provider,
                valid_providers.join(", ")
            )));
        }

        let valid_backends = ["memory", "sqlite"];
        if !valid_backends.contains(&self.store.backend.as_str()) {
            return Err(TutorError::Config(format!(
                "Invalid store backend '{}'. Must be one of: {}",
                self.store.backend,
                valid_backends.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.gemini.temperature) {
            return Err(TutorError::Config(
                "gemini temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(TutorError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.quiz.language.trim().is_empty() {
            return Err(TutorError::Config("quiz language must not be empty".to_string()));
        }

        self.bind_addr()?;

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                TutorError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        self.store.path = expand_path(&self.store.path)?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, TutorError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| TutorError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| TutorError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| TutorError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
