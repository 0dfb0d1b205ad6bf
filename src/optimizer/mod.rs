pub mod error;
pub mod params;
pub mod strategies;
pub mod types;

pub use error::*;
pub use params::*;
pub use strategies::*;
pub use types::*;
