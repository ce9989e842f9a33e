//! Errors raised while loading configuration and parsing shared types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    /// The configuration document is not valid JSON for [`crate::EvolutionConfig`]
    #[error("Malformed configuration: {message}")]
    DeserializationError { message: String },

    #[error("Invalid session id: {input}")]
    InvalidUuid { input: String },

    /// A parsed value failed validation
    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Cannot read {path}: {message}")]
    ConfigRead { path: String, message: String },
}

impl SharedError {
    pub fn invalid_config(field: impl Into<String>, value: impl Into<String>) -> Self {
        SharedError::InvalidConfig {
            field: field.into(),
            value: value.into(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
