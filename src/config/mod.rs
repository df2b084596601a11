//! Configuration module

pub mod settings;

pub use settings::{
    GenerationConfig, LimitsConfig, LoggingConfig, ServerConfig, Settings, StorageConfig,
};
