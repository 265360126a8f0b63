//! Module for reading and writing Models
pub mod json;

use thiserror::Error;

/// Errors raised while reading or writing model files
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Could not read file: {0}")]
    Read(#[source] std::io::Error),
    #[error("Could not write file: {0}")]
    Write(#[source] std::io::Error),
    #[error("Could not deserialize: {0}")]
    Deserialize(#[source] serde_json::Error),
    #[error("Could not serialize: {0}")]
    Serialize(#[source] serde_json::Error),
}
