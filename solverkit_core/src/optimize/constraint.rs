//! Provides struct for representing a constraint in an optimization problem
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::optimize::error::SolverError;
use crate::optimize::expression::LinearExpression;

/// Represents a named linear constraint `terms (relation) rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name, unique within the model
    name: String,
    /// Coefficients of the left hand side, keyed by variable name
    terms: IndexMap<String, f64>,
    /// How the left hand side relates to the right hand side
    relation: Relation,
    /// The right hand side
    rhs: f64,
}

impl Constraint {
    /// Create a new constraint
    ///
    /// Any constant in `expression` is moved to the right hand side, so
    /// `x + 2 <= 10` is stored as `x <= 8`.
    ///
    /// # Examples
    /// ```rust
    /// use solverkit_core::optimize::constraint::{Constraint, Relation};
    /// use solverkit_core::optimize::expression::LinearExpression;
    /// let expr = LinearExpression::from_terms(&[("x", 1.0)]) + 2.0;
    /// let cons = Constraint::new("cap", expr, Relation::LessEqual, 10.0);
    /// assert_eq!(cons.rhs(), 8.0);
    /// ```
    pub fn new(
        name: impl Into<String>,
        expression: LinearExpression,
        relation: Relation,
        rhs: f64,
    ) -> Self {
        let (terms, constant) = expression.into_parts();
        Constraint {
            name: name.into(),
            terms,
            relation,
            rhs: rhs - constant,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Iterate over the `(variable name, coefficient)` pairs of the left hand side
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.terms.iter().map(|(name, coef)| (name.as_str(), *coef))
    }

    /// The left hand side as an expression
    pub fn expression(&self) -> LinearExpression {
        self.terms().collect()
    }

    /// Does the left hand side mention this variable
    pub fn contains(&self, variable: &str) -> bool {
        self.terms.contains_key(variable)
    }

    /// Lower and upper limits on the left hand side implied by the relation
    pub fn row_bounds(&self) -> (f64, f64) {
        match self.relation {
            Relation::LessEqual => (f64::NEG_INFINITY, self.rhs),
            Relation::GreaterEqual => (self.rhs, f64::INFINITY),
            Relation::Equal => (self.rhs, self.rhs),
        }
    }

    /// Is the constraint satisfied by these values, within `tolerance`
    pub fn is_satisfied(&self, values: &IndexMap<String, f64>, tolerance: f64) -> bool {
        let lhs = self.expression().evaluate(values);
        match self.relation {
            Relation::LessEqual => lhs <= self.rhs + tolerance,
            Relation::GreaterEqual => lhs >= self.rhs - tolerance,
            Relation::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }

    pub(crate) fn set_rhs(&mut self, rhs: f64) {
        self.rhs = rhs;
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {} {}",
            self.name,
            self.expression(),
            self.relation,
            self.rhs
        )
    }
}

/// Relation between the two sides of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// `lhs <= rhs`
    #[serde(rename = "<=")]
    LessEqual,
    /// `lhs >= rhs`
    #[serde(rename = ">=")]
    GreaterEqual,
    /// `lhs == rhs`
    #[serde(rename = "==")]
    Equal,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::LessEqual => write!(f, "<="),
            Relation::GreaterEqual => write!(f, ">="),
            Relation::Equal => write!(f, "=="),
        }
    }
}

impl FromStr for Relation {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" | "=<" => Ok(Relation::LessEqual),
            ">=" | "=>" => Ok(Relation::GreaterEqual),
            "==" | "=" => Ok(Relation::Equal),
            other => Err(SolverError::InvalidArgument(format!(
                "unknown constraint relation `{}`",
                other
            ))),
        }
    }
}
