use std::time::Duration;
use thiserror::Error;

/// Caller-side precondition violations on a parameter snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("time_periods must be positive")]
    EmptyHorizon,

    #[error("{series} has {actual} entries, expected {expected}")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{series}[{index}] is not a finite number")]
    NonFinite { series: &'static str, index: usize },

    #[error("{fee} is not a finite number")]
    NonFiniteFee { fee: &'static str },

    #[error("{asset} {index}: {field} is not a finite number")]
    NonFiniteAsset {
        asset: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("battery {battery}: {which} efficiency {value} is outside (0, 1]")]
    EfficiencyOutOfRange {
        battery: usize,
        which: &'static str,
        value: f64,
    },

    #[error("ev {ev}: deadline slot {slot} is outside 0..{time_periods}")]
    DeadlineOutOfRange {
        ev: usize,
        slot: usize,
        time_periods: usize,
    },

    #[error("heat pump must-run slot {slot} is outside 0..{time_periods}")]
    MandatorySlotOutOfRange { slot: usize, time_periods: usize },
}

/// Hard failures of an optimizer run. "No plan" is not one of them.
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("invalid parameters: {0}")]
    InvalidInput(#[from] InputError),

    #[error("solver failure: {0}")]
    Solver(String),

    #[error("solve did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("solve task failed: {0}")]
    Task(String),
}
