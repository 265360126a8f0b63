//! Implements a solver interface for HiGHS
use ::highs::{HighsModelStatus, RowProblem, Sense, SolvedModel};
use indexmap::IndexMap;
use log::{debug, warn};

use crate::configuration::Configuration;
use crate::optimize::error::SolverError;
use crate::optimize::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::parameter::ParamValue;
use crate::optimize::solvers::{Backend, Capability};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, SolveResult};

/// Backend wrapping the [`highs`](::highs) bindings
pub struct HighsBackend {
    /// Print the HiGHS log
    verbose: bool,
    /// Solved model of the last solve
    solved: Option<SolvedModel>,
}

impl HighsBackend {
    pub fn new(configuration: &Configuration) -> Self {
        HighsBackend {
            verbose: configuration.verbose,
            solved: None,
        }
    }

    /// Apply an option to a HiGHS model
    fn apply_option(
        model: &mut ::highs::Model,
        name: &str,
        value: &ParamValue,
    ) -> Result<(), SolverError> {
        let applied = match value {
            ParamValue::Bool(v) => model.try_set_option(name, *v),
            ParamValue::Int(v) => {
                let v = i32::try_from(*v).map_err(|_| {
                    SolverError::invalid_parameter(name, "integer options must fit in 32 bits")
                })?;
                model.try_set_option(name, v)
            }
            ParamValue::Real(v) => model.try_set_option(name, *v),
            ParamValue::Text(v) => model.try_set_option(name, v.as_str()),
        };
        applied.map_err(|status| SolverError::invalid_parameter(name, format!("{:?}", status)))
    }
}

/// Sense constants
fn sense(sense: ObjectiveSense) -> Sense {
    match sense {
        ObjectiveSense::Maximize => Sense::Maximise,
        ObjectiveSense::Minimize => Sense::Minimise,
    }
}

/// Status translation table
fn translate_status(status: HighsModelStatus) -> OptimizationStatus {
    match status {
        HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => OptimizationStatus::Optimal,
        HighsModelStatus::Infeasible => OptimizationStatus::Infeasible,
        HighsModelStatus::UnboundedOrInfeasible => {
            warn!("HiGHS could not tell infeasible from unbounded, reporting infeasible");
            OptimizationStatus::Infeasible
        }
        HighsModelStatus::Unbounded => OptimizationStatus::Unbounded,
        _ => OptimizationStatus::Error,
    }
}

impl Backend for HighsBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::IntegerVariables => true,
            Capability::ConflictSubsystem
            | Capability::NativeExport
            | Capability::ExplicitArtifactRelease => false,
        }
    }

    fn solve(&mut self, model: &Model) -> Result<SolveResult, SolverError> {
        let objective = model.objective();
        let mut problem = RowProblem::default();
        let mut columns = IndexMap::with_capacity(model.num_variables());
        for var in model.variables() {
            let coef = objective.coefficient(var.name());
            let (lower, upper) = (var.lower_bound(), var.upper_bound());
            let column = match var.variable_type() {
                VariableType::Continuous => problem.add_column(coef, lower..=upper),
                VariableType::Integer => problem.add_integer_column(coef, lower..=upper),
                VariableType::Binary => {
                    problem.add_integer_column(coef, lower.max(0.0)..=upper.min(1.0))
                }
            };
            columns.insert(var.name().to_string(), column);
        }
        for cons in model.constraints() {
            let factors = cons
                .terms()
                .filter_map(|(name, coef)| columns.get(name).map(|col| (*col, coef)))
                .collect::<Vec<_>>();
            let (lower, upper) = cons.row_bounds();
            problem.add_row(lower..=upper, &factors[..]);
        }

        let mut highs_model = problem.optimise(sense(model.sense()));
        if !self.verbose {
            highs_model.make_quiet();
        }
        for (name, value) in model.parameters() {
            Self::apply_option(&mut highs_model, name, value)?;
        }
        let solved = highs_model
            .try_solve()
            .map_err(|status| SolverError::SolverFatal(format!("HiGHS failed: {:?}", status)))?;
        let native = solved.status();
        debug!("HiGHS finished `{}` with {:?}", model.name(), native);
        let status = translate_status(native);

        let result = if status.has_solution() {
            let solution = solved.get_solution();
            let values = columns
                .keys()
                .zip(solution.columns())
                .map(|(name, value)| (name.clone(), *value))
                .collect::<IndexMap<_, _>>();
            let objective_value = objective.expression().evaluate(&values);
            SolveResult::with_solution(status, objective_value, values)
        } else {
            SolveResult::without_solution(status)
        };
        self.solved = Some(solved);
        Ok(result)
    }

    fn release_solve_artifacts(&mut self) {
        self.solved = None;
    }

    fn check_parameter(&self, name: &str, value: &ParamValue) -> Result<(), SolverError> {
        let mut scratch = RowProblem::default().optimise(Sense::Minimise);
        scratch.make_quiet();
        Self::apply_option(&mut scratch, name, value)
    }
}
