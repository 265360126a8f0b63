//! Backend engines, and the registry used to pick one by name
//!
//! Each engine lives behind its own cargo feature. The registry maps backend
//! ids onto constructor functions, and [`AnyBackend`] dispatches statically
//! over whichever engines were compiled in.
use std::path::Path;

use crate::configuration::Configuration;
use crate::optimize::conflict::ConflictSubsystem;
use crate::optimize::error::SolverError;
use crate::optimize::model::Model;
use crate::optimize::parameter::ParamValue;
use crate::optimize::SolveResult;

#[cfg(feature = "highs")]
pub mod highs;
#[cfg(feature = "microlp")]
pub mod microlp;
#[cfg(feature = "scip")]
pub mod scip;

/// Optional functionality a backend may or may not offer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Integer and binary variables are honored
    IntegerVariables,
    /// [`Backend::compute_conflict_subsystem`] is available
    ConflictSubsystem,
    /// The backend writes models in native formats
    NativeExport,
    /// Solve artifacts must be released before the model can change
    ExplicitArtifactRelease,
}

/// The contract every wrapped engine implements
pub trait Backend {
    /// Id under which the backend is registered
    fn name(&self) -> &'static str;

    /// Does the backend offer an optional capability
    fn supports(&self, capability: Capability) -> bool;

    /// Build the model in the engine, solve it, and translate the outcome
    ///
    /// Infeasible and unbounded models are reported through the status of the
    /// result. Errors are reserved for engine failures.
    fn solve(&mut self, model: &Model) -> Result<SolveResult, SolverError>;

    /// Drop whatever the engine kept from the last solve. Must be idempotent.
    fn release_solve_artifacts(&mut self) {}

    /// Check that the engine accepts `value` for the parameter `name`
    fn check_parameter(&self, name: &str, value: &ParamValue) -> Result<(), SolverError>;

    /// Value the engine uses for a parameter which was never set
    fn default_parameter(&self, name: &str) -> Result<ParamValue, SolverError> {
        Err(SolverError::invalid_parameter(
            name,
            format!("no default is known to the {} backend", self.name()),
        ))
    }

    /// Native export formats (file extensions) of the engine
    fn export_formats(&self) -> &'static [&'static str] {
        &[]
    }

    /// Write `model` to `path` with the engine's writer for `format`
    fn write_native(
        &mut self,
        model: &Model,
        path: &Path,
        format: &str,
    ) -> Result<(), SolverError> {
        let _ = (model, path);
        Err(SolverError::UnsupportedFormat {
            backend: self.name(),
            format: format.to_string(),
        })
    }

    /// Compute an irreducible infeasible subsystem of `model`
    fn compute_conflict_subsystem(
        &mut self,
        model: &Model,
    ) -> Result<ConflictSubsystem, SolverError> {
        let _ = model;
        Err(SolverError::UnsupportedOperation {
            backend: self.name(),
            operation: "conflict subsystem computation",
        })
    }
}

cfg_if::cfg_if! {
    if #[cfg(not(any(feature = "microlp", feature = "highs", feature = "scip")))] {
        compile_error!("enable at least one solver backend feature: `microlp`, `highs` or `scip`");
    }
}

/// One of the compiled-in backends
pub enum AnyBackend {
    #[cfg(feature = "microlp")]
    Microlp(microlp::MicrolpBackend),
    #[cfg(feature = "highs")]
    Highs(highs::HighsBackend),
    #[cfg(feature = "scip")]
    Scip(scip::ScipBackend),
}

macro_rules! dispatch {
    ($value:expr, $backend:ident => $body:expr) => {
        match $value {
            #[cfg(feature = "microlp")]
            AnyBackend::Microlp($backend) => $body,
            #[cfg(feature = "highs")]
            AnyBackend::Highs($backend) => $body,
            #[cfg(feature = "scip")]
            AnyBackend::Scip($backend) => $body,
        }
    };
}

impl Backend for AnyBackend {
    fn name(&self) -> &'static str {
        dispatch!(self, b => b.name())
    }

    fn supports(&self, capability: Capability) -> bool {
        dispatch!(self, b => b.supports(capability))
    }

    fn solve(&mut self, model: &Model) -> Result<SolveResult, SolverError> {
        dispatch!(self, b => b.solve(model))
    }

    fn release_solve_artifacts(&mut self) {
        dispatch!(self, b => b.release_solve_artifacts())
    }

    fn check_parameter(&self, name: &str, value: &ParamValue) -> Result<(), SolverError> {
        dispatch!(self, b => b.check_parameter(name, value))
    }

    fn default_parameter(&self, name: &str) -> Result<ParamValue, SolverError> {
        dispatch!(self, b => b.default_parameter(name))
    }

    fn export_formats(&self) -> &'static [&'static str] {
        dispatch!(self, b => b.export_formats())
    }

    fn write_native(
        &mut self,
        model: &Model,
        path: &Path,
        format: &str,
    ) -> Result<(), SolverError> {
        dispatch!(self, b => b.write_native(model, path, format))
    }

    fn compute_conflict_subsystem(
        &mut self,
        model: &Model,
    ) -> Result<ConflictSubsystem, SolverError> {
        dispatch!(self, b => b.compute_conflict_subsystem(model))
    }
}

type BackendConstructor = fn(&Configuration) -> AnyBackend;

#[cfg(feature = "microlp")]
fn new_microlp(configuration: &Configuration) -> AnyBackend {
    AnyBackend::Microlp(microlp::MicrolpBackend::new(configuration))
}

#[cfg(feature = "highs")]
fn new_highs(configuration: &Configuration) -> AnyBackend {
    AnyBackend::Highs(highs::HighsBackend::new(configuration))
}

#[cfg(feature = "scip")]
fn new_scip(configuration: &Configuration) -> AnyBackend {
    AnyBackend::Scip(scip::ScipBackend::new(configuration))
}

/// Backend ids and their constructors, in order of preference
const REGISTRY: &[(&str, BackendConstructor)] = &[
    #[cfg(feature = "microlp")]
    ("microlp", new_microlp),
    #[cfg(feature = "highs")]
    ("highs", new_highs),
    #[cfg(feature = "scip")]
    ("scip", new_scip),
];

/// Ids of the backends compiled into this build
pub fn available_backends() -> Vec<&'static str> {
    REGISTRY.iter().map(|(id, _)| *id).collect()
}

/// Id of the preferred compiled-in backend
pub fn default_backend() -> &'static str {
    REGISTRY.first().map(|(id, _)| *id).unwrap_or("microlp")
}

/// Construct the backend registered under `name` (case-insensitive)
pub fn backend_from_name(
    name: &str,
    configuration: &Configuration,
) -> Result<AnyBackend, SolverError> {
    let wanted = name.trim().to_ascii_lowercase();
    REGISTRY
        .iter()
        .find(|(id, _)| *id == wanted)
        .map(|(_, constructor)| constructor(configuration))
        .ok_or_else(|| {
            SolverError::SolverFatal(format!(
                "backend `{}` is not installed, available backends: {}",
                name,
                available_backends().join(", ")
            ))
        })
}

#[cfg(all(test, feature = "microlp"))]
mod tests {
    use super::*;

    #[test]
    fn resolve_backend_by_name() {
        let configuration = Configuration::default();
        let backend = backend_from_name("MicroLP", &configuration).unwrap();
        assert_eq!(backend.name(), "microlp");
        assert!(available_backends().contains(&"microlp"));
    }

    #[test]
    fn unknown_backend_is_fatal() {
        let configuration = Configuration::default();
        match backend_from_name("gurobi", &configuration) {
            Err(SolverError::SolverFatal(msg)) => assert!(msg.contains("gurobi")),
            _ => panic!("Unknown backend not caught"),
        }
    }
}
