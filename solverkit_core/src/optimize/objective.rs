//! Provides struct for representing an optimization problem's objective
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::optimize::error::SolverError;
use crate::optimize::expression::LinearExpression;

/// Represents the Objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Linear expression to optimize
    expression: LinearExpression,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new objective with a given sense
    pub fn new(expression: LinearExpression, sense: ObjectiveSense) -> Self {
        Self { expression, sense }
    }

    /// Create a new empty maximization objective
    pub fn new_maximize() -> Self {
        Self::new(LinearExpression::new(), ObjectiveSense::Maximize)
    }

    pub fn expression(&self) -> &LinearExpression {
        &self.expression
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Objective coefficient of a variable, zero if absent
    pub fn coefficient(&self, variable: &str) -> f64 {
        self.expression.coefficient(variable)
    }

    /// Constant offset of the objective
    pub fn offset(&self) -> f64 {
        self.expression.get_constant()
    }

    /// Drop every term and the offset, keeping the sense
    pub fn clear(&mut self) {
        self.expression = LinearExpression::new();
    }
}

impl Default for Objective {
    fn default() -> Self {
        Self::new_maximize()
    }
}

impl Display for Objective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.sense, self.expression)
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

impl Display for ObjectiveSense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectiveSense::Minimize => write!(f, "minimize"),
            ObjectiveSense::Maximize => write!(f, "maximize"),
        }
    }
}

impl FromStr for ObjectiveSense {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" | "maximize" | "maximise" => Ok(ObjectiveSense::Maximize),
            "min" | "minimize" | "minimise" => Ok(ObjectiveSense::Minimize),
            other => Err(SolverError::InvalidArgument(format!(
                "invalid optimization sense `{}`",
                other
            ))),
        }
    }
}
