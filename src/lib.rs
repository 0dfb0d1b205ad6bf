pub mod assembly;
pub mod config;
pub mod domain;
pub mod optimizer;
pub mod telemetry;
