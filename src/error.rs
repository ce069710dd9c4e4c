//! Application error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Ambiguous(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse data file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("could not read config: {0}")]
    Config(#[from] toml::de::Error),
}

pub type AppResult<T> = Result<T, AppError>;
