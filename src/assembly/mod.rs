//! Parameter assembly
//!
//! Turns day-ahead prices, a solar forecast, live battery readings and static configuration
//! into one immutable [`ParameterSnapshot`](crate::optimizer::ParameterSnapshot).

pub mod builder;
pub mod prices;
pub mod solar;
pub mod sources;

pub use builder::*;
pub use prices::*;
pub use solar::*;
pub use sources::*;
