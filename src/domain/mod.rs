pub mod battery;
pub mod ev;
pub mod heat_pump;
pub mod horizon;
pub mod plan;

pub use battery::*;
pub use ev::*;
pub use heat_pump::*;
pub use horizon::*;
pub use plan::*;
