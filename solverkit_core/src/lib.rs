//! Core rust implementation of solverkit, a uniform adapter over mixed integer linear
//! programming solvers.
//!
//! Models are built through a [`SolverAdapter`](optimize::adapter::SolverAdapter), which
//! owns the model and one backend engine selected by name at construction. Engines are
//! cargo features: `microlp` (default, pure Rust), `highs` and `scip`.

pub mod configuration;
pub mod io;
pub mod optimize;
