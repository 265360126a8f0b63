//! The solver adapter: one model, one backend, and the solve lifecycle between them
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::configuration::Configuration;
use crate::io::json;
use crate::optimize::conflict::ConflictSubsystem;
use crate::optimize::constraint::{Constraint, Relation};
use crate::optimize::error::SolverError;
use crate::optimize::expression::LinearExpression;
use crate::optimize::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::parameter::ParamValue;
use crate::optimize::solvers::{backend_from_name, AnyBackend, Backend, Capability};
use crate::optimize::variable::{VariableBuilder, VariableHandle, VariableType};
use crate::optimize::{Lifecycle, OptimizationStatus, SolveResult};

/// Export format handled by the adapter itself, whatever the backend
pub const JSON_FORMAT: &str = "json";

/// Uniform front end over a MILP backend
///
/// Owns the [`Model`] and the backend for its whole life. Every structural
/// change (variables, constraints, right hand sides, bounds, objective) is
/// validated first; once accepted it releases the backend's solve artifacts,
/// drops the last [`SolveResult`] and puts the adapter back in
/// [`Lifecycle::Built`].
///
/// # Example
/// ```rust
/// use solverkit_core::optimize::adapter::SolverAdapter;
/// use solverkit_core::optimize::constraint::Relation;
/// use solverkit_core::optimize::objective::ObjectiveSense;
/// use solverkit_core::optimize::variable::VariableType;
/// use solverkit_core::optimize::OptimizationStatus;
///
/// let mut adapter = SolverAdapter::new("example").unwrap();
/// let x = adapter.add_variable(0., 10., VariableType::Integer, "x").unwrap();
/// adapter.add_constraint((&x).into(), Relation::LessEqual, 10., "cap").unwrap();
/// adapter.set_objective((&x).into(), ObjectiveSense::Maximize).unwrap();
/// assert_eq!(adapter.optimize().unwrap(), OptimizationStatus::Optimal);
/// assert!((adapter.objective_value().unwrap() - 10.).abs() < 1e-6);
/// ```
pub struct SolverAdapter<B: Backend = AnyBackend> {
    model: Model,
    backend: B,
    lifecycle: Lifecycle,
    result: Option<SolveResult>,
}

impl SolverAdapter {
    // region Creation Functions
    /// Create an adapter for an empty problem, using the default configuration
    pub fn new(problem_name: impl Into<String>) -> Result<Self, SolverError> {
        let configuration = Configuration {
            problem_name: problem_name.into(),
            ..Configuration::default()
        };
        Self::from_configuration(&configuration)
    }

    /// Create an adapter for an empty problem, with the backend named by the configuration
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, SolverError> {
        let backend = backend_from_name(&configuration.backend, configuration)?;
        Ok(Self::with_backend(configuration.problem_name.clone(), backend))
    }

    /// Create an adapter around a model previously written in the json format
    ///
    /// Stored parameters are checked against the configured backend.
    pub fn from_json_file<P: AsRef<Path>>(
        path: P,
        configuration: &Configuration,
    ) -> Result<Self, SolverError> {
        let model = json::read_model(path.as_ref())?;
        let backend = backend_from_name(&configuration.backend, configuration)?;
        for (name, value) in model.parameters() {
            backend.check_parameter(name, value)?;
        }
        info!(
            "Read model `{}` from {:?} ({} variables, {} constraints)",
            model.name(),
            path.as_ref(),
            model.num_variables(),
            model.num_constraints()
        );
        Ok(SolverAdapter {
            model,
            backend,
            lifecycle: Lifecycle::Built,
            result: None,
        })
    }
    // endregion Creation Functions
}

impl<B: Backend> SolverAdapter<B> {
    /// Create an adapter for an empty problem around an existing backend
    pub fn with_backend(problem_name: impl Into<String>, backend: B) -> Self {
        let model = Model::new(problem_name);
        debug!(
            "Created problem `{}` on the {} backend",
            model.name(),
            backend.name()
        );
        SolverAdapter {
            model,
            backend,
            lifecycle: Lifecycle::Built,
            result: None,
        }
    }

    // region Accessors
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Does the active backend offer an optional capability
    pub fn supports(&self, capability: Capability) -> bool {
        self.backend.supports(capability)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
    // endregion Accessors

    // region Model Construction
    /// Add a variable, returning a handle usable in expressions
    pub fn add_variable(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
        variable_type: VariableType,
        name: &str,
    ) -> Result<VariableHandle, SolverError> {
        let variable = VariableBuilder::default()
            .name(name)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .variable_type(variable_type)
            .build()?;
        let handle = self.model.add_variable(variable)?;
        self.release_solve_artifacts();
        Ok(handle)
    }

    /// Add the constraint `expression relation rhs` under `name`
    pub fn add_constraint(
        &mut self,
        expression: LinearExpression,
        relation: Relation,
        rhs: f64,
        name: &str,
    ) -> Result<(), SolverError> {
        self.model
            .add_constraint(Constraint::new(name, expression, relation, rhs))?;
        self.release_solve_artifacts();
        Ok(())
    }

    /// Remove a constraint, returning it
    pub fn remove_constraint(&mut self, name: &str) -> Result<Constraint, SolverError> {
        let removed = self.model.remove_constraint(name)?;
        self.release_solve_artifacts();
        Ok(removed)
    }

    /// Change the right hand side of a constraint
    pub fn change_rhs(&mut self, name: &str, rhs: f64) -> Result<(), SolverError> {
        self.model.set_rhs(name, rhs)?;
        self.release_solve_artifacts();
        Ok(())
    }

    /// Change both bounds of a variable
    pub fn set_variable_bounds(
        &mut self,
        name: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), SolverError> {
        self.model
            .set_variable_bounds(name, lower_bound, upper_bound)?;
        self.release_solve_artifacts();
        Ok(())
    }

    /// Replace the objective
    pub fn set_objective(
        &mut self,
        expression: LinearExpression,
        sense: ObjectiveSense,
    ) -> Result<(), SolverError> {
        self.model.set_objective(expression, sense)?;
        self.release_solve_artifacts();
        Ok(())
    }
    // endregion Model Construction

    // region Model Queries
    pub fn get_variable_handle(&self, name: &str) -> Result<VariableHandle, SolverError> {
        self.model
            .variable(name)
            .map(|var| var.handle())
            .ok_or_else(|| SolverError::variable_not_found(name))
    }

    pub fn get_constraint(&self, name: &str) -> Result<&Constraint, SolverError> {
        self.model
            .constraint(name)
            .ok_or_else(|| SolverError::constraint_not_found(name))
    }

    /// Constraint names, in the order they were added
    pub fn list_constraints(&self) -> Vec<&str> {
        self.model.constraints().map(|c| c.name()).collect()
    }

    /// Variable names, in the order they were added
    pub fn list_variables(&self) -> Vec<&str> {
        self.model.variables().map(|v| v.name()).collect()
    }
    // endregion Model Queries

    // region Solving
    /// Solve the model, blocking until the backend returns
    ///
    /// Infeasible and unbounded models are statuses, not errors. An error means
    /// the backend itself failed, and leaves the adapter in
    /// `Solved(OptimizationStatus::Error)` without a result.
    pub fn optimize(&mut self) -> Result<OptimizationStatus, SolverError> {
        self.backend.release_solve_artifacts();
        self.result = None;
        self.lifecycle = Lifecycle::Solving;
        info!(
            "Solving `{}` with {} ({} variables, {} constraints)",
            self.model.name(),
            self.backend.name(),
            self.model.num_variables(),
            self.model.num_constraints()
        );
        match self.backend.solve(&self.model) {
            Ok(result) => {
                let status = result.status;
                info!("Solve of `{}` finished: {}", self.model.name(), status);
                self.lifecycle = Lifecycle::Solved(status);
                self.result = Some(result);
                Ok(status)
            }
            Err(err) => {
                warn!("Solve of `{}` failed: {}", self.model.name(), err);
                self.lifecycle = Lifecycle::Solved(OptimizationStatus::Error);
                Err(err)
            }
        }
    }

    /// Drop the backend's solve artifacts and the last result. Idempotent.
    pub fn release_solve_artifacts(&mut self) {
        if self.lifecycle != Lifecycle::Built || self.result.is_some() {
            debug!("Releasing solve artifacts of `{}`", self.model.name());
        }
        self.backend.release_solve_artifacts();
        self.result = None;
        self.lifecycle = Lifecycle::Built;
    }
    // endregion Solving

    // region Results
    pub fn solve_result(&self) -> Option<&SolveResult> {
        self.result.as_ref()
    }

    /// Terminal status of the last solve, `None` until a solve finished
    pub fn status(&self) -> Option<OptimizationStatus> {
        match self.lifecycle {
            Lifecycle::Solved(status) => Some(status),
            Lifecycle::Built | Lifecycle::Solving => None,
        }
    }

    pub fn objective_value(&self) -> Option<f64> {
        self.result.as_ref().and_then(|r| r.objective_value)
    }

    pub fn best_bound(&self) -> Option<f64> {
        self.result.as_ref().and_then(|r| r.best_bound)
    }

    pub fn gap(&self) -> Option<f64> {
        self.result.as_ref().and_then(|r| r.gap)
    }

    pub fn node_count(&self) -> Option<u64> {
        self.result.as_ref().and_then(|r| r.node_count)
    }

    /// Value of a variable in the last solution
    ///
    /// Fails with [`SolverError::NotFound`] for an unknown name, or when there
    /// is no solution to read from.
    pub fn get_variable_value(&self, name: &str) -> Result<f64, SolverError> {
        if self.model.variable(name).is_none() {
            return Err(SolverError::variable_not_found(name));
        }
        self.variable_values()?
            .get(name)
            .copied()
            .ok_or_else(|| {
                SolverError::NotFound(format!("no value for `{}` in the solution", name))
            })
    }

    /// Values of every variable in the last solution
    pub fn variable_values(&self) -> Result<&IndexMap<String, f64>, SolverError> {
        self.result
            .as_ref()
            .and_then(|r| r.variable_values.as_ref())
            .ok_or_else(|| {
                SolverError::NotFound(format!(
                    "no solution available for `{}` ({})",
                    self.model.name(),
                    self.status()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "not solved".to_string())
                ))
            })
    }
    // endregion Results

    // region Parameters
    /// Set a backend parameter, the backend decides if name and value are valid
    pub fn set_param(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), SolverError> {
        let value = value.into();
        self.backend.check_parameter(name, &value)?;
        debug!("Setting parameter {} = {}", name, value);
        self.model.set_parameter(name, value);
        Ok(())
    }

    /// Current value of a backend parameter
    pub fn get_param(&self, name: &str) -> Result<ParamValue, SolverError> {
        match self.model.parameter(name) {
            Some(value) => Ok(value.clone()),
            None => self.backend.default_parameter(name),
        }
    }
    // endregion Parameters

    // region Export
    /// Write the model to `<path>.<format>`, returning the written path
    ///
    /// `json` is always available, other formats depend on the backend. An
    /// unknown format fails before anything is written.
    pub fn write_model<P: AsRef<Path>>(
        &mut self,
        path: P,
        format: &str,
    ) -> Result<PathBuf, SolverError> {
        let format = format.trim().trim_start_matches('.').to_ascii_lowercase();
        let native = self.backend.export_formats().contains(&format.as_str());
        if format != JSON_FORMAT && !native {
            return Err(SolverError::UnsupportedFormat {
                backend: self.backend.name(),
                format,
            });
        }
        let mut target = OsString::from(path.as_ref().as_os_str());
        target.push(".");
        target.push(&format);
        let target = PathBuf::from(target);

        if format == JSON_FORMAT {
            json::write_model(&self.model, &target)?;
        } else {
            self.backend.write_native(&self.model, &target, &format)?;
        }
        info!("Wrote `{}` to {:?}", self.model.name(), target);
        Ok(target)
    }
    // endregion Export

    // region Conflicts
    /// Compute an irreducible infeasible subsystem of the model
    pub fn compute_conflict_subsystem(&mut self) -> Result<ConflictSubsystem, SolverError> {
        if !self.backend.supports(Capability::ConflictSubsystem) {
            return Err(SolverError::UnsupportedOperation {
                backend: self.backend.name(),
                operation: "conflict subsystem computation",
            });
        }
        let conflict = self.backend.compute_conflict_subsystem(&self.model)?;
        info!(
            "Conflict subsystem of `{}`: constraints {:?}, bounds of {:?}",
            self.model.name(),
            conflict.constraints,
            conflict.variable_bounds
        );
        Ok(conflict)
    }
    // endregion Conflicts
}
