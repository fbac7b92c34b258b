//! Configuration errors.

use thiserror::Error;

/// Fatal errors. Any of these aborts the whole configuration load.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} block not found in config")]
    BlockNotFound(String),

    #[error("self-reference detected in key: {0}")]
    SelfReference(String),

    #[error("reference to undefined key '{reference}' in '{key}'")]
    UndefinedReference { key: String, reference: String },

    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
