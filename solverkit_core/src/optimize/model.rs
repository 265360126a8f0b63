//! Provides struct representing an optimization problem instance
use indexmap::IndexMap;

use crate::optimize::constraint::{Constraint, Relation};
use crate::optimize::error::SolverError;
use crate::optimize::expression::LinearExpression;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::parameter::ParamValue;
use crate::optimize::variable::{check_bounds, Variable, VariableHandle};

/// An optimization problem: variables, constraints, objective and parameters
///
/// Every mutating method validates its input first and leaves the model
/// untouched when it returns an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Label of the problem
    name: String,
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem, keyed by name
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem, keyed by name
    constraints: IndexMap<String, Constraint>,
    /// Backend parameters which have been explicitly set
    parameters: IndexMap<String, ParamValue>,
}

impl Model {
    // region Creation Functions
    /// Create a new, empty, maximization problem
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objective: Objective::default(),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
            parameters: IndexMap::new(),
        }
    }
    // endregion Creation Functions

    // region Accessors
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.objective.sense()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.get(name)
    }

    /// Variables in registration order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.variables.values()
    }

    /// Constraints in registration order
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.constraints.values()
    }

    pub fn parameters(&self) -> &IndexMap<String, ParamValue> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Does the model contain integer or binary variables
    pub fn has_integer_variables(&self) -> bool {
        self.variables.values().any(Variable::is_integral)
    }
    // endregion Accessors

    // region Adding Variables and Constraints
    /// Add a variable to the model, returning a handle to it
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<VariableHandle, SolverError> {
        self.validate_variable(&variable)?;
        variable.set_index(self.variables.len());
        let handle = variable.handle();
        self.variables.insert(variable.name().to_string(), variable);
        Ok(handle)
    }

    /// Add a constraint to the model
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        self.validate_constraint(&constraint)?;
        self.constraints
            .insert(constraint.name().to_string(), constraint);
        Ok(())
    }

    /// Create a new constraint and add it to the model
    pub fn add_new_constraint(
        &mut self,
        name: &str,
        expression: LinearExpression,
        relation: Relation,
        rhs: f64,
    ) -> Result<(), SolverError> {
        self.add_constraint(Constraint::new(name, expression, relation, rhs))
    }
    // endregion Adding Variables and Constraints

    // region Updates
    /// Replace the objective of the model
    pub fn set_objective(
        &mut self,
        expression: LinearExpression,
        sense: ObjectiveSense,
    ) -> Result<(), SolverError> {
        self.validate_expression(&expression)?;
        if !expression.get_constant().is_finite() {
            return Err(SolverError::InvalidArgument(
                "objective offset must be finite".to_string(),
            ));
        }
        self.objective = Objective::new(expression, sense);
        Ok(())
    }

    /// Change the right hand side of a constraint
    pub fn set_rhs(&mut self, name: &str, rhs: f64) -> Result<(), SolverError> {
        if rhs.is_nan() {
            return Err(SolverError::InvalidArgument(
                "constraint right hand side must not be NaN".to_string(),
            ));
        }
        match self.constraints.get_mut(name) {
            Some(cons) => {
                cons.set_rhs(rhs);
                Ok(())
            }
            None => Err(SolverError::constraint_not_found(name)),
        }
    }

    /// Update the bounds of a variable
    pub fn set_variable_bounds(
        &mut self,
        name: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), SolverError> {
        check_bounds(lower_bound, upper_bound).map_err(SolverError::InvalidArgument)?;
        match self.variables.get_mut(name) {
            Some(var) => {
                var.set_bounds(lower_bound, upper_bound);
                Ok(())
            }
            None => Err(SolverError::variable_not_found(name)),
        }
    }

    /// Drop every objective term and the offset, keeping the sense
    pub fn clear_objective(&mut self) {
        self.objective.clear();
    }

    /// Record a backend parameter value
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) {
        self.parameters.insert(name.to_string(), value);
    }
    // endregion Updates

    // region Remove Constraints
    /// Remove a constraint (by name) from the model, returning it
    pub fn remove_constraint(&mut self, name: &str) -> Result<Constraint, SolverError> {
        self.constraints
            .shift_remove(name)
            .ok_or_else(|| SolverError::constraint_not_found(name))
    }
    // endregion Remove Constraints

    // region Validation Functions
    /// Check that a variable to be added is valid to add to this model
    fn validate_variable(&self, variable: &Variable) -> Result<(), SolverError> {
        if self.variables.contains_key(variable.name()) {
            return Err(SolverError::InvalidArgument(format!(
                "a variable named `{}` already exists",
                variable.name()
            )));
        }
        check_bounds(variable.lower_bound(), variable.upper_bound())
            .map_err(SolverError::InvalidArgument)
    }

    /// Check that a constraint to be added is valid to add to this model
    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), SolverError> {
        if constraint.name().is_empty() {
            return Err(SolverError::InvalidArgument(
                "constraint name must not be empty".to_string(),
            ));
        }
        if self.constraints.contains_key(constraint.name()) {
            return Err(SolverError::InvalidArgument(format!(
                "a constraint named `{}` already exists",
                constraint.name()
            )));
        }
        if constraint.rhs().is_nan() {
            return Err(SolverError::InvalidArgument(format!(
                "constraint `{}` has a NaN right hand side",
                constraint.name()
            )));
        }
        self.validate_expression(&constraint.expression())
    }

    /// Check that every variable in an expression is in the model and every
    /// coefficient is finite
    fn validate_expression(&self, expression: &LinearExpression) -> Result<(), SolverError> {
        for (name, coef) in expression.terms() {
            if !self.variables.contains_key(name) {
                return Err(SolverError::variable_not_found(name));
            }
            if !coef.is_finite() {
                return Err(SolverError::InvalidArgument(format!(
                    "coefficient of `{}` must be finite",
                    name
                )));
            }
        }
        Ok(())
    }
    // endregion Validation Functions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::variable::{VariableBuilder, VariableType};

    fn var(name: &str, lower_bound: f64, upper_bound: f64) -> Variable {
        VariableBuilder::default()
            .name(name)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()
            .unwrap()
    }

    #[test]
    fn new_model() {
        let model = Model::new("lp_prob");
        assert_eq!(model.name(), "lp_prob");
        assert_eq!(model.sense(), ObjectiveSense::Maximize);
        assert_eq!(model.num_variables(), 0);
        assert_eq!(model.num_constraints(), 0);
    }

    #[test]
    fn add_variables() {
        let mut model = Model::new("test");
        let x = model.add_variable(var("x", 64., 100.)).unwrap();
        assert_eq!(x.name(), "x");
        assert_eq!(x.index(), 0);
        let y = model
            .add_variable(
                VariableBuilder::default()
                    .name("y")
                    .variable_type(VariableType::Integer)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(y.index(), 1);
        assert!(model.has_integer_variables());
        let stored = model.variable("x").unwrap();
        assert!((stored.lower_bound() - 64.).abs() < 1e-25);
        assert!((stored.upper_bound() - 100.).abs() < 1e-25);
    }

    #[test]
    fn duplicate_variable() {
        let mut model = Model::new("test");
        model.add_variable(var("x", 0., 1.)).unwrap();
        match model.add_variable(var("x", 0., 2.)) {
            Err(SolverError::InvalidArgument(_)) => {}
            _ => panic!("Duplicate variable name not caught"),
        }
        assert!((model.variable("x").unwrap().upper_bound() - 1.).abs() < 1e-25);
    }

    #[test]
    fn add_constraint() {
        let mut model = Model::new("test");
        model.add_variable(var("x", 64., 100.)).unwrap();
        model.add_variable(var("y", 64., 100.)).unwrap();
        model
            .add_new_constraint(
                "test_constraint",
                LinearExpression::from_terms(&[("x", 2.), ("y", 3.)]),
                Relation::Equal,
                200.,
            )
            .unwrap();
        let cons = model.constraint("test_constraint").unwrap();
        assert!((cons.rhs() - 200.).abs() < 1e-25);
        assert_eq!(cons.relation(), Relation::Equal);

        // Same name again
        let res = model.add_new_constraint(
            "test_constraint",
            LinearExpression::from_terms(&[("x", 1.)]),
            Relation::LessEqual,
            100.,
        );
        assert!(matches!(res, Err(SolverError::InvalidArgument(_))));
    }

    #[test]
    fn add_bad_constraint() {
        let mut model = Model::new("test");
        model.add_variable(var("x", 0., 10.)).unwrap();
        let res = model.add_new_constraint(
            "bad",
            LinearExpression::from_terms(&[("x", 1.), ("z", 1.)]),
            Relation::LessEqual,
            1.,
        );
        assert!(matches!(res, Err(SolverError::NotFound(_))));
        let res = model.add_new_constraint(
            "nan",
            LinearExpression::from_terms(&[("x", f64::NAN)]),
            Relation::LessEqual,
            1.,
        );
        assert!(matches!(res, Err(SolverError::InvalidArgument(_))));
        assert_eq!(model.num_constraints(), 0);
    }

    #[test]
    fn remove_constraint() {
        let mut model = Model::new("test");
        model.add_variable(var("x", 0., 10.)).unwrap();
        for name in ["a", "b", "c"] {
            model
                .add_new_constraint(
                    name,
                    LinearExpression::from_terms(&[("x", 1.)]),
                    Relation::LessEqual,
                    5.,
                )
                .unwrap();
        }
        let removed = model.remove_constraint("b").unwrap();
        assert_eq!(removed.name(), "b");
        let names = model.constraints().map(|c| c.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "c"]);
        assert!(matches!(
            model.remove_constraint("b"),
            Err(SolverError::NotFound(_))
        ));
    }

    #[test]
    fn update_bounds_and_rhs() {
        let mut model = Model::new("test");
        model.add_variable(var("x", 0., 10.)).unwrap();
        model
            .add_new_constraint(
                "cap",
                LinearExpression::from_terms(&[("x", 1.)]),
                Relation::LessEqual,
                5.,
            )
            .unwrap();
        model.set_rhs("cap", 7.).unwrap();
        assert!((model.constraint("cap").unwrap().rhs() - 7.).abs() < 1e-25);
        assert!(matches!(
            model.set_rhs("nope", 1.),
            Err(SolverError::NotFound(_))
        ));

        model.set_variable_bounds("x", 1., 2.).unwrap();
        assert!((model.variable("x").unwrap().lower_bound() - 1.).abs() < 1e-25);
        assert!(matches!(
            model.set_variable_bounds("x", 3., 2.),
            Err(SolverError::InvalidArgument(_))
        ));
        assert!((model.variable("x").unwrap().upper_bound() - 2.).abs() < 1e-25);
    }

    #[test]
    fn clear_objective_keeps_sense() {
        let mut model = Model::new("test");
        model.add_variable(var("x", 0., 10.)).unwrap();
        model
            .set_objective(
                LinearExpression::from_terms(&[("x", 3.)]) + 1.,
                ObjectiveSense::Minimize,
            )
            .unwrap();
        model.clear_objective();
        assert!(model.objective().expression().is_empty());
        assert!(model.objective().offset().abs() < 1e-25);
        assert_eq!(model.sense(), ObjectiveSense::Minimize);
    }

    #[test]
    fn objective_must_reference_model_variables() {
        let mut model = Model::new("test");
        model.add_variable(var("x", 0., 10.)).unwrap();
        let res = model.set_objective(
            LinearExpression::from_terms(&[("y", 1.)]),
            ObjectiveSense::Minimize,
        );
        assert!(matches!(res, Err(SolverError::NotFound(_))));
        assert_eq!(model.sense(), ObjectiveSense::Maximize);
        model
            .set_objective(
                LinearExpression::from_terms(&[("x", 1.)]),
                ObjectiveSense::Minimize,
            )
            .unwrap();
        assert_eq!(model.sense(), ObjectiveSense::Minimize);
    }
}
