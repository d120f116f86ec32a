//! Error types for the animation core

use thiserror::Error;

/// Main error type for odori operations
#[derive(Error, Debug)]
pub enum OdoriError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Clip table error: {0}")]
    Clip(#[from] ClipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Clip-table errors
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("Failed to read clip file: {0}")]
    ReadFile(String),

    #[error("Failed to parse clip table: {0}")]
    Parse(String),
}

/// Result type alias for odori operations
pub type Result<T> = std::result::Result<T, OdoriError>;
