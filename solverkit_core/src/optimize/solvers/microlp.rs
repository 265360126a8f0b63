//! Implements a solver interface for microlp, a pure Rust LP and MILP solver
use ::microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Solution, Variable};
use indexmap::IndexMap;
use log::{debug, warn};

use crate::configuration::Configuration;
use crate::optimize::conflict::{deletion_filter, ConflictSubsystem};
use crate::optimize::constraint::Relation;
use crate::optimize::error::SolverError;
use crate::optimize::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::parameter::ParamValue;
use crate::optimize::solvers::{Backend, Capability};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, SolveResult};

/// Round integer and binary variable values to the nearest integer
pub const ROUND_INTEGERS: &str = "round_integers";

/// Backend wrapping [`microlp`](::microlp)
///
/// microlp has no incremental model editing, so each solve builds a fresh
/// [`Problem`]. The last [`Solution`] is kept until it is released.
pub struct MicrolpBackend {
    /// Distance from an integer within which integral values are rounded
    tolerance: f64,
    /// Solution of the last solve
    solution: Option<Solution>,
}

impl MicrolpBackend {
    pub fn new(configuration: &Configuration) -> Self {
        MicrolpBackend {
            tolerance: configuration.tolerance,
            solution: None,
        }
    }

    /// Translate the model into a microlp problem
    ///
    /// Returns the problem along with the microlp variable of every model
    /// variable, in model order. Fails when an integral variable has a finite
    /// bound outside the `i32` range microlp works with.
    fn build_problem(model: &Model) -> Result<(Problem, IndexMap<String, Variable>), SolverError> {
        let mut problem = Problem::new(direction(model.sense()));
        let objective = model.objective();
        let mut columns = IndexMap::with_capacity(model.num_variables());
        for var in model.variables() {
            let coef = objective.coefficient(var.name());
            let (lower, upper) = (var.lower_bound(), var.upper_bound());
            let column = match var.variable_type() {
                VariableType::Continuous => problem.add_var(coef, (lower, upper)),
                VariableType::Binary if lower <= 0.0 && upper >= 1.0 => {
                    problem.add_binary_var(coef)
                }
                VariableType::Binary => problem.add_integer_var(
                    coef,
                    (
                        integer_bound(var.name(), lower.max(0.0).ceil())?,
                        integer_bound(var.name(), upper.min(1.0).floor())?,
                    ),
                ),
                VariableType::Integer => problem.add_integer_var(
                    coef,
                    (
                        integer_bound(var.name(), lower.ceil())?,
                        integer_bound(var.name(), upper.floor())?,
                    ),
                ),
            };
            columns.insert(var.name().to_string(), column);
        }
        for cons in model.constraints() {
            let mut lhs = LinearExpr::empty();
            for (name, coef) in cons.terms() {
                if let Some(column) = columns.get(name) {
                    lhs.add(*column, coef);
                }
            }
            problem.add_constraint(lhs, comparison(cons.relation()), cons.rhs());
        }
        Ok((problem, columns))
    }

    fn round_integers(model: &Model) -> bool {
        model
            .parameter(ROUND_INTEGERS)
            .and_then(ParamValue::as_bool)
            .unwrap_or(true)
    }

    /// Read the variable values out of a solution
    fn extract_values(
        &self,
        model: &Model,
        columns: &IndexMap<String, Variable>,
        solution: &Solution,
    ) -> IndexMap<String, f64> {
        let round = Self::round_integers(model);
        model
            .variables()
            .filter_map(|var| {
                let column = columns.get(var.name())?;
                let mut value = *solution.var_value(*column);
                if round && var.is_integral() && (value - value.round()).abs() <= self.tolerance {
                    value = value.round();
                }
                Some((var.name().to_string(), value))
            })
            .collect()
    }

    /// Solve the model without keeping anything, used as a feasibility oracle
    fn is_infeasible(model: &Model) -> Result<bool, SolverError> {
        let (problem, _) = Self::build_problem(model)?;
        match problem.solve() {
            Ok(_) | Err(::microlp::Error::Unbounded) => Ok(false),
            Err(::microlp::Error::Infeasible) => Ok(true),
            Err(::microlp::Error::InternalError(msg)) => Err(SolverError::SolverFatal(msg)),
        }
    }
}

/// Sense constants
fn direction(sense: ObjectiveSense) -> OptimizationDirection {
    match sense {
        ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        ObjectiveSense::Minimize => OptimizationDirection::Minimize,
    }
}

/// Relation constants
fn comparison(relation: Relation) -> ComparisonOp {
    match relation {
        Relation::LessEqual => ComparisonOp::Le,
        Relation::GreaterEqual => ComparisonOp::Ge,
        Relation::Equal => ComparisonOp::Eq,
    }
}

/// microlp takes integer bounds as `i32`, infinite bounds saturate
fn integer_bound(name: &str, value: f64) -> Result<i32, SolverError> {
    if value == f64::INFINITY {
        Ok(i32::MAX)
    } else if value == f64::NEG_INFINITY {
        Ok(i32::MIN)
    } else if value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Ok(value as i32)
    } else {
        Err(SolverError::SolverFatal(format!(
            "bound {} of integer variable `{}` is outside the range microlp supports",
            value, name
        )))
    }
}

/// An integral variable with an infinite bound which ended on the saturated
/// `i32` limit standing in for that bound
fn saturated_variable<'a>(model: &'a Model, values: &IndexMap<String, f64>) -> Option<&'a str> {
    model
        .variables()
        .filter(|var| var.is_integral())
        .find(|var| {
            let value = values.get(var.name()).copied().unwrap_or(0.0);
            (var.upper_bound() == f64::INFINITY && value >= i32::MAX as f64 - 0.5)
                || (var.lower_bound() == f64::NEG_INFINITY && value <= i32::MIN as f64 + 0.5)
        })
        .map(|var| var.name())
}

impl Backend for MicrolpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::IntegerVariables | Capability::ConflictSubsystem => true,
            Capability::NativeExport | Capability::ExplicitArtifactRelease => false,
        }
    }

    fn solve(&mut self, model: &Model) -> Result<SolveResult, SolverError> {
        self.solution = None;
        let (problem, columns) = Self::build_problem(model)?;
        debug!("Built microlp problem {:?}", problem);
        match problem.solve() {
            Ok(solution) => {
                let values = self.extract_values(model, &columns, &solution);
                if let Some(name) = saturated_variable(model, &values) {
                    debug!("`{}` sits on the integer limit of microlp, reporting unbounded", name);
                    return Ok(SolveResult::without_solution(OptimizationStatus::Unbounded));
                }
                for cons in model.constraints() {
                    if !cons.is_satisfied(&values, self.tolerance.max(1e-6)) {
                        warn!("microlp solution violates constraint `{}`", cons.name());
                    }
                }
                let objective_value = solution.objective() + model.objective().offset();
                let mut result = SolveResult::with_solution(
                    OptimizationStatus::Optimal,
                    objective_value,
                    values,
                );
                result.best_bound = Some(objective_value);
                result.gap = Some(0.0);
                self.solution = Some(solution);
                Ok(result)
            }
            Err(::microlp::Error::Infeasible) => {
                Ok(SolveResult::without_solution(OptimizationStatus::Infeasible))
            }
            Err(::microlp::Error::Unbounded) => {
                Ok(SolveResult::without_solution(OptimizationStatus::Unbounded))
            }
            Err(::microlp::Error::InternalError(msg)) => Err(SolverError::SolverFatal(format!(
                "microlp failed on `{}`: {}",
                model.name(),
                msg
            ))),
        }
    }

    fn release_solve_artifacts(&mut self) {
        self.solution = None;
    }

    fn check_parameter(&self, name: &str, value: &ParamValue) -> Result<(), SolverError> {
        match name {
            ROUND_INTEGERS => match value {
                ParamValue::Bool(_) => Ok(()),
                other => Err(SolverError::invalid_parameter(
                    name,
                    format!("expected a bool, got a {}", other.type_name()),
                )),
            },
            _ => Err(SolverError::invalid_parameter(
                name,
                "unknown microlp parameter",
            )),
        }
    }

    fn default_parameter(&self, name: &str) -> Result<ParamValue, SolverError> {
        match name {
            ROUND_INTEGERS => Ok(ParamValue::Bool(true)),
            _ => Err(SolverError::invalid_parameter(
                name,
                "unknown microlp parameter",
            )),
        }
    }

    fn compute_conflict_subsystem(
        &mut self,
        model: &Model,
    ) -> Result<ConflictSubsystem, SolverError> {
        deletion_filter(model, Self::is_infeasible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::expression::LinearExpression;
    use crate::optimize::variable::VariableBuilder;

    fn backend() -> MicrolpBackend {
        MicrolpBackend::new(&Configuration::default())
    }

    fn add_var(model: &mut Model, name: &str, kind: VariableType, lower: f64, upper: f64) {
        model
            .add_variable(
                VariableBuilder::default()
                    .name(name)
                    .variable_type(kind)
                    .lower_bound(lower)
                    .upper_bound(upper)
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }

    #[test]
    fn solve_small_lp() {
        // Maximize x + 2y, 0 <= y <= 3, x + y <= 4, 2x + y >= 2
        let mut model = Model::new("lp");
        add_var(&mut model, "x", VariableType::Continuous, 0., f64::INFINITY);
        add_var(&mut model, "y", VariableType::Continuous, 0., 3.);
        model
            .add_new_constraint(
                "c1",
                LinearExpression::from_terms(&[("x", 1.), ("y", 1.)]),
                Relation::LessEqual,
                4.,
            )
            .unwrap();
        model
            .add_new_constraint(
                "c2",
                LinearExpression::from_terms(&[("x", 2.), ("y", 1.)]),
                Relation::GreaterEqual,
                2.,
            )
            .unwrap();
        model
            .set_objective(
                LinearExpression::from_terms(&[("x", 1.), ("y", 2.)]),
                ObjectiveSense::Maximize,
            )
            .unwrap();

        let result = backend().solve(&model).unwrap();
        assert_eq!(result.status, OptimizationStatus::Optimal);
        assert!((result.objective_value.unwrap() - 7.).abs() < 1e-6);
        assert!((result.variable_value("x").unwrap() - 1.).abs() < 1e-6);
        assert!((result.variable_value("y").unwrap() - 3.).abs() < 1e-6);
        assert!(result.gap.unwrap().abs() < 1e-25);
    }

    #[test]
    fn objective_offset_is_added() {
        let mut model = Model::new("offset");
        add_var(&mut model, "x", VariableType::Integer, 0., 3.);
        model
            .add_new_constraint(
                "cap",
                LinearExpression::from_terms(&[("x", 1.)]),
                Relation::LessEqual,
                3.,
            )
            .unwrap();
        model
            .set_objective(
                LinearExpression::from_terms(&[("x", 1.)]) + 10.,
                ObjectiveSense::Minimize,
            )
            .unwrap();
        let result = backend().solve(&model).unwrap();
        assert!((result.objective_value.unwrap() - 10.).abs() < 1e-6);
        assert!(result.variable_value("x").unwrap().abs() < 1e-6);
    }

    #[test]
    fn binary_variables() {
        // Knapsack: maximize 5a + 4b + 3c, 2a + 3b + c <= 4
        let mut model = Model::new("knapsack");
        for name in ["a", "b", "c"] {
            add_var(&mut model, name, VariableType::Binary, 0., 1.);
        }
        model
            .add_new_constraint(
                "weight",
                LinearExpression::from_terms(&[("a", 2.), ("b", 3.), ("c", 1.)]),
                Relation::LessEqual,
                4.,
            )
            .unwrap();
        model
            .set_objective(
                LinearExpression::from_terms(&[("a", 5.), ("b", 4.), ("c", 3.)]),
                ObjectiveSense::Maximize,
            )
            .unwrap();
        let result = backend().solve(&model).unwrap();
        assert_eq!(result.status, OptimizationStatus::Optimal);
        assert!((result.objective_value.unwrap() - 8.).abs() < 1e-6);
        assert_eq!(result.variable_value("a"), Some(1.));
        assert_eq!(result.variable_value("b"), Some(0.));
        assert_eq!(result.variable_value("c"), Some(1.));
    }

    #[test]
    fn unbounded_is_a_status() {
        let mut model = Model::new("unbounded");
        add_var(&mut model, "x", VariableType::Continuous, 0., f64::INFINITY);
        model
            .add_new_constraint(
                "floor",
                LinearExpression::from_terms(&[("x", 1.)]),
                Relation::GreaterEqual,
                1.,
            )
            .unwrap();
        model
            .set_objective(
                LinearExpression::from_terms(&[("x", 1.)]),
                ObjectiveSense::Maximize,
            )
            .unwrap();
        let result = backend().solve(&model).unwrap();
        assert_eq!(result.status, OptimizationStatus::Unbounded);
        assert!(result.objective_value.is_none());
    }

    #[test]
    fn parameters() {
        let backend = backend();
        assert!(backend
            .check_parameter(ROUND_INTEGERS, &ParamValue::Bool(false))
            .is_ok());
        assert!(matches!(
            backend.check_parameter(ROUND_INTEGERS, &ParamValue::Int(1)),
            Err(SolverError::InvalidParameter { .. })
        ));
        assert!(matches!(
            backend.check_parameter("TimeLimit", &ParamValue::Real(10.)),
            Err(SolverError::InvalidParameter { .. })
        ));
        assert_eq!(
            backend.default_parameter(ROUND_INTEGERS).unwrap(),
            ParamValue::Bool(true)
        );
    }

    #[test]
    fn integer_bounds_saturate() {
        assert_eq!(integer_bound("x", f64::INFINITY).unwrap(), i32::MAX);
        assert_eq!(integer_bound("x", f64::NEG_INFINITY).unwrap(), i32::MIN);
        assert_eq!(integer_bound("x", 4.).unwrap(), 4);
        assert!(matches!(
            integer_bound("x", 1e12),
            Err(SolverError::SolverFatal(_))
        ));
    }

    #[test]
    fn unbounded_integer_variable() {
        let mut model = Model::new("unbounded_integer");
        add_var(&mut model, "x", VariableType::Integer, 0., f64::INFINITY);
        model
            .set_objective(
                LinearExpression::from_terms(&[("x", 1.)]),
                ObjectiveSense::Maximize,
            )
            .unwrap();
        let result = backend().solve(&model).unwrap();
        assert_eq!(result.status, OptimizationStatus::Unbounded);
        assert!(result.objective_value.is_none());

        model
            .set_objective(
                LinearExpression::from_terms(&[("x", 1.)]),
                ObjectiveSense::Minimize,
            )
            .unwrap();
        model.set_variable_bounds("x", f64::NEG_INFINITY, 0.).unwrap();
        let result = backend().solve(&model).unwrap();
        assert_eq!(result.status, OptimizationStatus::Unbounded);
    }

    #[test]
    fn integer_bound_out_of_range() {
        let mut model = Model::new("huge");
        add_var(&mut model, "x", VariableType::Integer, 0., 1e12);
        model
            .add_new_constraint(
                "cap",
                LinearExpression::from_terms(&[("x", 1.)]),
                Relation::LessEqual,
                5e9,
            )
            .unwrap();
        model
            .set_objective(
                LinearExpression::from_terms(&[("x", 1.)]),
                ObjectiveSense::Maximize,
            )
            .unwrap();
        let mut backend = backend();
        assert!(matches!(
            backend.solve(&model),
            Err(SolverError::SolverFatal(_))
        ));
        assert!(matches!(
            MicrolpBackend::is_infeasible(&model),
            Err(SolverError::SolverFatal(_))
        ));
        assert!(matches!(
            backend.compute_conflict_subsystem(&model),
            Err(SolverError::SolverFatal(_))
        ));
    }
}
