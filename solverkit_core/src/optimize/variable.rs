//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::optimize::error::SolverError;

/// A decision variable of a [`Model`](crate::optimize::model::Model)
///
/// Variables are created with [`VariableBuilder`], which checks the bounds, and
/// are registered through the adapter. Only the bounds may change afterwards.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Variable {
    /// Name, unique within the model
    #[builder(setter(into))]
    name: String,
    /// Lowest value the variable can take
    #[builder(default = "0.0")]
    lower_bound: f64,
    /// Highest value the variable can take
    #[builder(default = "f64::INFINITY")]
    upper_bound: f64,
    /// Domain of the variable
    #[builder(default = "VariableType::Continuous")]
    variable_type: VariableType,
    /// Position of the variable in the model, assigned on registration
    #[builder(setter(skip))]
    index: usize,
}

impl VariableBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.is_empty() {
                return Err("variable name must not be empty".to_string());
            }
        }
        let lower = self.lower_bound.unwrap_or(0.0);
        let upper = self.upper_bound.unwrap_or(f64::INFINITY);
        check_bounds(lower, upper)
    }
}

/// Check that a pair of bounds describes a non-empty interval
pub(crate) fn check_bounds(lower: f64, upper: f64) -> Result<(), String> {
    if lower.is_nan() || upper.is_nan() {
        return Err("variable bounds must not be NaN".to_string());
    }
    if lower > upper {
        return Err(format!(
            "lower bound {} is greater than upper bound {}",
            lower, upper
        ));
    }
    Ok(())
}

impl From<VariableBuilderError> for SolverError {
    fn from(value: VariableBuilderError) -> Self {
        SolverError::InvalidArgument(value.to_string())
    }
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn variable_type(&self) -> VariableType {
        self.variable_type
    }

    /// Position of the variable in the model's registration order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Is the variable restricted to integral values
    pub fn is_integral(&self) -> bool {
        self.variable_type != VariableType::Continuous
    }

    /// Handle referencing this variable
    pub fn handle(&self) -> VariableHandle {
        VariableHandle {
            name: self.name.clone(),
            index: self.index,
        }
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn set_bounds(&mut self, lower_bound: f64, upper_bound: f64) {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
    }

    /// Bounds the variable would have with no explicit bounds at all
    pub(crate) fn natural_bounds(&self) -> (f64, f64) {
        match self.variable_type {
            VariableType::Binary => (0.0, 1.0),
            VariableType::Continuous | VariableType::Integer => {
                (f64::NEG_INFINITY, f64::INFINITY)
            }
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <= {}:{} <= {}",
            self.lower_bound, self.name, self.variable_type, self.upper_bound
        )
    }
}

/// Lightweight reference to a variable registered in a model
///
/// Handles are what calling code uses to build expressions, see
/// [`LinearExpression`](crate::optimize::expression::LinearExpression).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableHandle {
    name: String,
    index: usize,
}

impl VariableHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for VariableHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Represents the type of variable in an optimization problem
///
/// # Notes:
/// Every backend maps these onto its own kind constants, see the
/// [`solvers`](crate::optimize::solvers) module
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
    /// Binary Variable
    Binary,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
            VariableType::Binary => write!(f, "BINARY"),
        }
    }
}

impl FromStr for VariableType {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "continuous" => Ok(VariableType::Continuous),
            "i" | "integer" => Ok(VariableType::Integer),
            "b" | "binary" => Ok(VariableType::Binary),
            other => Err(SolverError::InvalidArgument(format!(
                "unknown variable kind `{}`",
                other
            ))),
        }
    }
}
