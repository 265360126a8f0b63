//! Implements a solver interface for SCIP, through Russcip
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, warn};
use russcip::prelude::*;
use russcip::{
    Model as ScipModel, ObjSense, PluginsIncluded, ProblemCreated, Solved, Status, VarType,
    Variable,
};

use crate::configuration::Configuration;
use crate::optimize::error::SolverError;
use crate::optimize::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::parameter::ParamValue;
use crate::optimize::solvers::{Backend, Capability};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, SolveResult};

/// Backend wrapping SCIP
///
/// The solved SCIP model is kept after a solve. Its transformed problem has to
/// be freed before the problem changes, which is what
/// [`Backend::release_solve_artifacts`] does.
pub struct ScipBackend {
    /// Print the SCIP log
    verbose: bool,
    /// Solved model of the last solve
    solved: Option<ScipModel<Solved>>,
}

impl ScipBackend {
    pub fn new(configuration: &Configuration) -> Self {
        ScipBackend {
            verbose: configuration.verbose,
            solved: None,
        }
    }

    /// Start a SCIP instance with default plugins
    fn create_instance(&self) -> ScipModel<PluginsIncluded> {
        let scip = ScipModel::new();
        let scip = if self.verbose { scip } else { scip.hide_output() };
        scip.include_default_plugins()
    }

    /// Translate the model into SCIP, returning the SCIP variable of each model variable
    fn build_problem(
        &self,
        model: &Model,
    ) -> Result<(ScipModel<ProblemCreated>, IndexMap<String, Rc<Variable>>), SolverError> {
        let mut scip = self.create_instance();
        for (name, value) in model.parameters() {
            scip = apply_parameter(scip, name, value)?;
        }
        let mut scip = scip
            .create_prob(model.name())
            .set_obj_sense(sense(model.sense()));
        let objective = model.objective();
        let mut columns = IndexMap::with_capacity(model.num_variables());
        for var in model.variables() {
            let column = scip.add_var(
                var.lower_bound(),
                var.upper_bound(),
                objective.coefficient(var.name()),
                var.name(),
                var_type(var.variable_type()),
            );
            columns.insert(var.name().to_string(), column);
        }
        for cons in model.constraints() {
            let (vars, coefs): (Vec<_>, Vec<_>) = cons
                .terms()
                .filter_map(|(name, coef)| columns.get(name).map(|var| (var.clone(), coef)))
                .unzip();
            let (lower, upper) = cons.row_bounds();
            scip.add_cons(vars, &coefs, lower, upper, cons.name());
        }
        Ok((scip, columns))
    }
}

/// Sense constants
fn sense(sense: ObjectiveSense) -> ObjSense {
    match sense {
        ObjectiveSense::Maximize => ObjSense::Maximize,
        ObjectiveSense::Minimize => ObjSense::Minimize,
    }
}

/// Variable kind constants
fn var_type(variable_type: VariableType) -> VarType {
    match variable_type {
        VariableType::Continuous => VarType::Continuous,
        VariableType::Integer => VarType::Integer,
        VariableType::Binary => VarType::Binary,
    }
}

/// Status translation table
///
/// Runs stopped by a limit count as feasible when SCIP holds an incumbent.
fn translate_status(status: Status, has_incumbent: bool) -> OptimizationStatus {
    match status {
        Status::Optimal => OptimizationStatus::Optimal,
        Status::Infeasible => OptimizationStatus::Infeasible,
        Status::Inforunbd => {
            warn!("SCIP could not tell infeasible from unbounded, reporting infeasible");
            OptimizationStatus::Infeasible
        }
        Status::Unbounded => OptimizationStatus::Unbounded,
        _ if has_incumbent => OptimizationStatus::Feasible,
        _ => OptimizationStatus::Error,
    }
}

/// Pass a parameter through to SCIP
fn apply_parameter(
    scip: ScipModel<PluginsIncluded>,
    name: &str,
    value: &ParamValue,
) -> Result<ScipModel<PluginsIncluded>, SolverError> {
    let applied = match value {
        ParamValue::Int(v) => match i32::try_from(*v) {
            Ok(v) => scip.set_int_param(name, v),
            Err(_) => scip.set_longint_param(name, *v),
        },
        ParamValue::Real(v) => scip.set_real_param(name, *v),
        ParamValue::Text(v) => scip.set_str_param(name, v),
        ParamValue::Bool(_) => {
            return Err(SolverError::invalid_parameter(
                name,
                "SCIP boolean parameters are set as integers (0 or 1)",
            ))
        }
    };
    applied.map_err(|code| SolverError::invalid_parameter(name, format!("{:?}", code)))
}

impl Backend for ScipBackend {
    fn name(&self) -> &'static str {
        "scip"
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::IntegerVariables
            | Capability::NativeExport
            | Capability::ExplicitArtifactRelease => true,
            Capability::ConflictSubsystem => false,
        }
    }

    fn solve(&mut self, model: &Model) -> Result<SolveResult, SolverError> {
        self.release_solve_artifacts();
        let (scip, columns) = self.build_problem(model)?;
        let solved = scip.solve();
        let incumbent = solved.best_sol();
        let native = solved.status();
        debug!("SCIP finished `{}` with {:?}", model.name(), native);
        let status = translate_status(native, incumbent.is_some());

        let mut result = match incumbent {
            Some(sol) if status.has_solution() => {
                let values = columns
                    .iter()
                    .map(|(name, var)| (name.clone(), sol.val(var.clone())))
                    .collect::<IndexMap<_, _>>();
                let objective_value = solved.obj_val();
                let mut result = SolveResult::with_solution(status, objective_value, values);
                if status == OptimizationStatus::Optimal {
                    result.best_bound = Some(objective_value);
                    result.gap = Some(0.0);
                }
                result
            }
            _ => SolveResult::without_solution(status),
        };
        result.node_count = Some(solved.n_nodes() as u64);
        self.solved = Some(solved);
        Ok(result)
    }

    fn release_solve_artifacts(&mut self) {
        if let Some(solved) = self.solved.take() {
            debug!("Freeing the SCIP transformed problem");
            drop(solved.free_transform());
        }
    }

    fn check_parameter(&self, name: &str, value: &ParamValue) -> Result<(), SolverError> {
        apply_parameter(self.create_instance(), name, value).map(|_| ())
    }

    fn export_formats(&self) -> &'static [&'static str] {
        &["cip", "lp", "mps"]
    }

    fn write_native(
        &mut self,
        model: &Model,
        path: &Path,
        format: &str,
    ) -> Result<(), SolverError> {
        let (scip, _) = self.build_problem(model)?;
        let path = path.to_str().ok_or_else(|| {
            SolverError::InvalidArgument(format!("path {:?} is not valid UTF-8", path))
        })?;
        scip.write(path, format)
            .map_err(|code| SolverError::SolverFatal(format!("SCIP writer failed: {:?}", code)))
    }
}
