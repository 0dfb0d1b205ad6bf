//! Dispatch strategies
//!
//! - MILP: mixed-integer linear programming over all assets (exact solution)

pub mod milp;

pub use milp::*;
