//! Generator error types

use std::fmt;
use thiserror::Error;

/// Result type for generator operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Whether a backend failure is worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Overload, rate limit or model warm-up; expected to clear on retry
    Transient,
    Fatal,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorKind::Transient => f.write_str("transient"),
            BackendErrorKind::Fatal => f.write_str("fatal"),
        }
    }
}

/// Failure reported by a generation backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} backend error: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Fatal,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == BackendErrorKind::Transient
    }
}

/// Generator error types
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Artifact storage error: {message}")]
    StorageError { message: String },

    #[error("Backend configuration error: {message}")]
    ConfigError { message: String },

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GeneratorError {
    pub fn storage(message: impl Into<String>) -> Self {
        GeneratorError::StorageError { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        GeneratorError::ConfigError { message: message.into() }
    }
}
