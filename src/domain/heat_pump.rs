use serde::{Deserialize, Serialize};

use super::SLOTS_PER_HOUR;

/// Heat pump with a fixed draw while running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatPumpAsset {
    pub power_kw: f64,
    /// Minimum run time across the horizon, in whole hours.
    pub run_hours: u32,
    /// Slots in which the heat pump must be on.
    #[serde(default)]
    pub must_run_slots: Vec<usize>,
}

impl HeatPumpAsset {
    /// Run time in slots. Saturates instead of wrapping so absurd run times stay absurd.
    pub fn required_slots(&self) -> usize {
        (self.run_hours as usize).saturating_mul(SLOTS_PER_HOUR as usize)
    }
}
