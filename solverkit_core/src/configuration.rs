//! Settings read when a solver adapter is constructed
use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::IoError;
use crate::optimize::error::SolverError;
use crate::optimize::solvers::default_backend;

/// Environment variable overriding the backend of [`Configuration::default`]
pub const BACKEND_ENV_VAR: &str = "SOLVERKIT_BACKEND";

/// Settings for a [`SolverAdapter`](crate::optimize::adapter::SolverAdapter)
///
/// Each adapter takes its configuration by value when it is built; there is
/// no global configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Name given to new problems
    pub problem_name: String,
    /// Id of the backend to use, see
    /// [`available_backends`](crate::optimize::solvers::available_backends)
    pub backend: String,
    /// Integrality tolerance used when reading integer variable values
    pub tolerance: f64,
    /// Let the backend print its own log
    pub verbose: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            problem_name: "lp_prob".to_string(),
            backend: env::var(BACKEND_ENV_VAR).unwrap_or_else(|_| default_backend().to_string()),
            tolerance: 1e-6,
            verbose: false,
        }
    }
}

impl Configuration {
    /// Configuration using a specific backend
    pub fn with_backend(backend: impl Into<String>) -> Self {
        Configuration {
            backend: backend.into(),
            ..Configuration::default()
        }
    }

    /// Read a configuration from a JSON file, missing fields take their default
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SolverError> {
        let data = fs::read_to_string(path.as_ref()).map_err(IoError::Read)?;
        let configuration: Configuration =
            serde_json::from_str(&data).map_err(IoError::Deserialize)?;
        if !(configuration.tolerance >= 0.0) {
            return Err(SolverError::InvalidArgument(format!(
                "tolerance must be non-negative, got {}",
                configuration.tolerance
            )));
        }
        Ok(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_backend() {
        let configuration = Configuration::with_backend("scip");
        assert_eq!(configuration.backend, "scip");
        assert_eq!(configuration.problem_name, "lp_prob");
        assert!((configuration.tolerance - 1e-6).abs() < 1e-25);
    }

    #[test]
    fn partial_json() {
        let path = env::temp_dir().join(format!(
            "solverkit_configuration_{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"backend": "highs", "verbose": true}"#).unwrap();
        let configuration = Configuration::from_json_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(configuration.backend, "highs");
        assert!(configuration.verbose);
        assert_eq!(configuration.problem_name, "lp_prob");
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Configuration::from_json_file("/definitely/not/here.json"),
            Err(SolverError::Io(IoError::Read(_)))
        ));
    }
}
