//! Evolution-specific error types

use thiserror::Error;
use shared::SharedError;
use generator::GeneratorError;

#[derive(Error, Debug)]
pub enum EvolutionError {
    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Missing credential: {key}")]
    MissingCredential { key: String },

    #[error("Presenter failed: {message}")]
    PresentationError { message: String },

    #[error("Publish failed: {message}")]
    PublishError { message: String },

    #[error("Prompt rewrite failed: {message}")]
    RewriteError { message: String },

    #[error("Generator component error: {0}")]
    GeneratorError(#[from] GeneratorError),

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EvolutionError {
    pub fn config(field: impl Into<String>) -> Self {
        EvolutionError::ConfigurationError { field: field.into() }
    }

    pub fn presentation(message: impl Into<String>) -> Self {
        EvolutionError::PresentationError { message: message.into() }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        EvolutionError::PublishError { message: message.into() }
    }

    pub fn rewrite(message: impl Into<String>) -> Self {
        EvolutionError::RewriteError { message: message.into() }
    }
}

pub type EvolutionResult<T> = Result<T, EvolutionError>;
