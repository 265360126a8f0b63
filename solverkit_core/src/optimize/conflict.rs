//! Computation of conflict subsystems (irreducible infeasible subsystems)
//!
//! The deletion filter only needs a feasibility oracle, so any backend that can
//! re-solve cheaply can offer it. Each constraint and each variable bound is
//! relaxed in turn, and stays relaxed if the remaining system is still
//! infeasible. What survives is irreducible: dropping any one member makes the
//! system feasible.
use log::debug;

use crate::optimize::error::SolverError;
use crate::optimize::model::Model;

/// An irreducible infeasible subset of a model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConflictSubsystem {
    /// Names of the constraints in the conflict
    pub constraints: Vec<String>,
    /// Names of the variables whose bounds are part of the conflict
    pub variable_bounds: Vec<String>,
}

/// Find a conflict subsystem of `model` with a deletion filter
///
/// `is_infeasible` is called on relaxed copies of the model, which have no
/// objective. Fails with [`SolverError::InvalidArgument`] when the model is
/// feasible in the first place.
pub fn deletion_filter<F>(
    model: &Model,
    mut is_infeasible: F,
) -> Result<ConflictSubsystem, SolverError>
where
    F: FnMut(&Model) -> Result<bool, SolverError>,
{
    let mut relaxed = model.clone();
    relaxed.clear_objective();
    if !is_infeasible(&relaxed)? {
        return Err(SolverError::InvalidArgument(format!(
            "model `{}` is feasible, it has no conflict subsystem",
            model.name()
        )));
    }

    let mut solves = 1usize;
    let mut conflict = ConflictSubsystem::default();

    let constraint_names = model
        .constraints()
        .map(|c| c.name().to_string())
        .collect::<Vec<_>>();
    for name in constraint_names {
        let mut candidate = relaxed.clone();
        candidate.remove_constraint(&name)?;
        solves += 1;
        if is_infeasible(&candidate)? {
            relaxed = candidate;
        } else {
            conflict.constraints.push(name);
        }
    }

    let bounded = model
        .variables()
        .filter(|v| (v.lower_bound(), v.upper_bound()) != v.natural_bounds())
        .map(|v| (v.name().to_string(), v.natural_bounds()))
        .collect::<Vec<_>>();
    for (name, (lower, upper)) in bounded {
        let mut candidate = relaxed.clone();
        candidate.set_variable_bounds(&name, lower, upper)?;
        solves += 1;
        if is_infeasible(&candidate)? {
            relaxed = candidate;
        } else {
            conflict.variable_bounds.push(name);
        }
    }

    debug!(
        "Conflict subsystem of `{}` found after {} solves: {} constraints, {} bounds",
        model.name(),
        solves,
        conflict.constraints.len(),
        conflict.variable_bounds.len()
    );
    Ok(conflict)
}
