//! Module for constructing and solving optimization problems

pub mod adapter;
pub mod conflict;
pub mod constraint;
pub mod error;
pub mod expression;
pub mod model;
pub mod objective;
pub mod parameter;
pub mod solvers;
pub mod variable;

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Struct representing the outcome of one solve of an optimization problem
///
/// Everything but `status` is only defined when the status carries a
/// solution ([`OptimizationStatus::has_solution`]), and is `None` otherwise.
/// The bound, gap and node count are diagnostics which not every backend
/// reports.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveResult {
    /// The status of the optimization problem, representing if the optimization was
    /// completed successfully
    pub status: OptimizationStatus,
    /// Value of the objective at the returned solution
    pub objective_value: Option<f64>,
    /// Best proven bound on the objective
    pub best_bound: Option<f64>,
    /// Relative gap between the objective value and the best bound
    pub gap: Option<f64>,
    /// Number of branch-and-bound nodes explored
    pub node_count: Option<u64>,
    /// Values of the variables at the solution, keyed by variable name
    pub variable_values: Option<IndexMap<String, f64>>,
}

impl SolveResult {
    /// Create a result for a solve which produced no usable solution
    pub fn without_solution(status: OptimizationStatus) -> Self {
        SolveResult {
            status,
            objective_value: None,
            best_bound: None,
            gap: None,
            node_count: None,
            variable_values: None,
        }
    }

    /// Create a result carrying a solution
    pub fn with_solution(
        status: OptimizationStatus,
        objective_value: f64,
        variable_values: IndexMap<String, f64>,
    ) -> Self {
        SolveResult {
            status,
            objective_value: Some(objective_value),
            best_bound: None,
            gap: None,
            node_count: None,
            variable_values: Some(variable_values),
        }
    }

    /// Value of a single variable, if the result carries a solution
    pub fn variable_value(&self, name: &str) -> Option<f64> {
        self.variable_values
            .as_ref()
            .and_then(|values| values.get(name).copied())
    }
}

/// Terminal status of a solve
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizationStatus {
    /// A proven optimal solution was found
    Optimal,
    /// A feasible solution was found, but optimality is not proven
    Feasible,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// The backend stopped without a usable answer
    Error,
}

impl OptimizationStatus {
    /// Does this status come with a solution
    pub fn has_solution(&self) -> bool {
        matches!(
            self,
            OptimizationStatus::Optimal | OptimizationStatus::Feasible
        )
    }
}

impl Display for OptimizationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationStatus::Optimal => write!(f, "OPTIMAL"),
            OptimizationStatus::Feasible => write!(f, "FEASIBLE"),
            OptimizationStatus::Infeasible => write!(f, "INFEASIBLE"),
            OptimizationStatus::Unbounded => write!(f, "UNBOUNDED"),
            OptimizationStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Where a [`SolverAdapter`](adapter::SolverAdapter) is in its solve lifecycle
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// The model has been built or changed since the last solve
    Built,
    /// A solve is running
    Solving,
    /// The last solve finished with the given status
    Solved(OptimizationStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_without_solution_is_empty() {
        let result = SolveResult::without_solution(OptimizationStatus::Infeasible);
        assert!(result.objective_value.is_none());
        assert!(result.best_bound.is_none());
        assert!(result.gap.is_none());
        assert!(result.node_count.is_none());
        assert!(result.variable_value("x").is_none());
    }

    #[test]
    fn status_solution_availability() {
        assert!(OptimizationStatus::Optimal.has_solution());
        assert!(OptimizationStatus::Feasible.has_solution());
        assert!(!OptimizationStatus::Infeasible.has_solution());
        assert!(!OptimizationStatus::Unbounded.has_solution());
        assert!(!OptimizationStatus::Error.has_solution());
    }
}
