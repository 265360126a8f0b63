//! Errors raised by the solver adapter and its backends
use thiserror::Error;

use crate::io::IoError;

/// Errors associated with building, solving, and exporting a model
#[derive(Error, Debug)]
pub enum SolverError {
    /// A variable or constraint name is unknown, or no solution is available yet
    #[error("Not found: {0}")]
    NotFound(String),
    /// A malformed sense, kind, relation, bound, or a name collision
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The active backend lacks an optional capability
    #[error("Backend `{backend}` does not support {operation}")]
    UnsupportedOperation {
        /// Id of the active backend
        backend: &'static str,
        /// Operation that was requested
        operation: &'static str,
    },
    /// The requested export format is not known to the active backend
    #[error("Backend `{backend}` cannot write models in the `{format}` format")]
    UnsupportedFormat {
        /// Id of the active backend
        backend: &'static str,
        /// Format that was requested
        format: String,
    },
    /// The backend rejected a parameter name or value
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the parameter
        name: String,
        /// Reason reported by the backend
        reason: String,
    },
    /// The backend crashed or is misconfigured (missing, not compiled in, ...)
    #[error("Solver failure: {0}")]
    SolverFatal(String),
    /// Reading or writing a model file failed
    #[error(transparent)]
    Io(#[from] IoError),
}

impl SolverError {
    pub(crate) fn variable_not_found(name: &str) -> Self {
        SolverError::NotFound(format!("no variable named `{}` in the model", name))
    }

    pub(crate) fn constraint_not_found(name: &str) -> Self {
        SolverError::NotFound(format!("no constraint named `{}` in the model", name))
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        SolverError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
