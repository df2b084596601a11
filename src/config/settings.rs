//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MIB: u64 = 1024 * 1024;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Wall-clock budget for one edit request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_body_bytes() -> u64 {
    32 * MIB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// External generation API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_modalities")]
    pub modalities: Vec<String>,
}

fn default_generation_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash-image-preview".to_string()
}

fn default_timeout() -> u64 {
    55000
}

fn default_modalities() -> Vec<String> {
    vec!["image".to_string(), "text".to_string()]
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generation_endpoint(),
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout(),
            modalities: default_modalities(),
        }
    }
}

impl GenerationConfig {
    /// API key, treating a blank value the same as an unset one
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }
}

/// Upload ceilings applied before any decode work
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    #[serde(default = "default_max_mask_bytes")]
    pub max_mask_bytes: u64,
    #[serde(default = "default_max_insert_bytes")]
    pub max_insert_bytes: u64,
    #[serde(default = "default_max_side_px")]
    pub max_side_px: u32,
    #[serde(default = "default_max_total_pixels")]
    pub max_total_pixels: u64,
}

fn default_max_image_bytes() -> u64 {
    12 * MIB
}

fn default_max_mask_bytes() -> u64 {
    6 * MIB
}

fn default_max_insert_bytes() -> u64 {
    8 * MIB
}

fn default_max_side_px() -> u32 {
    4096
}

fn default_max_total_pixels() -> u64 {
    4096 * 4096
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            max_mask_bytes: default_max_mask_bytes(),
            max_insert_bytes: default_max_insert_bytes(),
            max_side_px: default_max_side_px(),
            max_total_pixels: default_max_total_pixels(),
        }
    }
}

/// Blob persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_storage_prefix")]
    pub prefix: String,
    #[serde(default = "default_storage_timeout")]
    pub timeout_ms: u64,
}

fn default_storage_endpoint() -> String {
    "https://blob.vercel-storage.com".to_string()
}

fn default_storage_prefix() -> String {
    "edits".to_string()
}

fn default_storage_timeout() -> u64 {
    20000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_storage_endpoint(),
            token: None,
            prefix: default_storage_prefix(),
            timeout_ms: default_storage_timeout(),
        }
    }
}

impl StorageConfig {
    /// Persistence runs only when switched on and credentials exist
    pub fn is_active(&self) -> bool {
        self.enabled && self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_str().ok_or_else(|| {
            AppError::Config(config::ConfigError::Message(
                "Configuration path is not valid UTF-8".to_string(),
            ))
        })?;

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("storage.enabled", false)?
            // Load from configuration file
            .add_source(File::with_name(path).required(false))
            // Override with environment variables (prefixed with ROOM_EDIT_)
            .add_source(
                Environment::with_prefix("ROOM_EDIT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("generation.modalities")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(invalid("Request timeout must be greater than 0"));
        }
        if self.generation.endpoint.trim().is_empty() {
            return Err(invalid("Generation endpoint cannot be empty"));
        }
        if self.generation.model.trim().is_empty() {
            return Err(invalid("Generation model cannot be empty"));
        }
        if self.generation.timeout_ms == 0 {
            return Err(invalid("Generation timeout must be greater than 0"));
        }

        let limits = &self.limits;
        if limits.max_image_bytes == 0
            || limits.max_mask_bytes == 0
            || limits.max_insert_bytes == 0
            || limits.max_side_px == 0
            || limits.max_total_pixels == 0
        {
            return Err(invalid("Upload limits must be greater than 0"));
        }

        if self.storage.enabled && self.storage.endpoint.trim().is_empty() {
            return Err(invalid("Storage endpoint cannot be empty when storage is enabled"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            generation: GenerationConfig::default(),
            limits: LimitsConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
