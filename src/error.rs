use std::path::PathBuf;
use thiserror::Error;

/// Failures of the interior generation pipeline.
///
/// Rejected or failing upstream calls are not errors here: they are reported
/// through `GenerationOutcome` so the caller can tell "no key configured"
/// apart from "every key failed".
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("image generation is not configured: set STABILITY_API_KEYS or STABILITY_API_KEY")]
    NotConfigured,
    #[error("failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Client error: {0}")]
    ClientError(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP is not configured: {0}")]
    NotConfigured(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("assistant is not configured: set OPENAI_API_KEY")]
    NotConfigured,
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("Crypto error: {0}")]
    Crypto(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
