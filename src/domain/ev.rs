use serde::{Deserialize, Serialize};

/// Parameters of one electric vehicle for a single optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvAsset {
    #[serde(default)]
    pub name: String,
    pub capacity_kwh: f64,
    pub initial_soc_kwh: f64,
    pub target_soc_kwh: f64,
    /// Slot index whose closing SoC must reach `target_soc_kwh`.
    pub deadline_slot: usize,
    pub max_charge_kw: f64,
    /// Lowest power the charger can deliver while it is charging at all.
    pub min_charge_kw: f64,
}

impl EvAsset {
    /// Upper bound on the SoC reachable at the deadline when charging flat out.
    pub fn best_case_soc_at_deadline(&self, slot_hours: f64) -> f64 {
        let slots = (self.deadline_slot + 1) as f64;
        (self.initial_soc_kwh + self.max_charge_kw * slot_hours * slots).min(self.capacity_kwh)
    }

    pub fn soc_fraction(&self, soc_kwh: f64) -> f64 {
        if self.capacity_kwh > 0.0 {
            soc_kwh / self.capacity_kwh
        } else {
            0.0
        }
    }
}
