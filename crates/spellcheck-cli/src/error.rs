//! Error handling for the Spellcheck CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] spellcheck_core::TrackerError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] spellcheck_runtime::RuntimeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Console input error: {0}")]
    Console(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Console(format!("{:#}", err))
    }
}

impl From<spellcheck_core::PersistenceError> for CliError {
    fn from(err: spellcheck_core::PersistenceError) -> Self {
        CliError::Tracker(err.into())
    }
}
