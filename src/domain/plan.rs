use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BatteryMode, SLOT_HOURS};

/// Powers below this are treated as zero when inferring operating modes.
pub const ACTIVE_POWER_KW: f64 = 1e-6;

/// Slot-by-slot operating plan produced by one optimizer run.
///
/// `profit` is the solved objective: import and export powers (kW) scored with per-slot
/// prices. Every slot has the same duration, so it ranks plans correctly but is not money.
/// Use [`DispatchPlan::profit_currency`] for the amount in currency, which multiplies by the
/// slot duration in hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchPlan {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub profit: f64,
    pub slots: Vec<SlotPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotPlan {
    pub time: DateTime<Utc>,
    pub spot_price: f64,
    pub predicted_solar_kw: f64,
    pub house_consumption_kw: f64,
    pub grid_import_kw: f64,
    pub grid_export_kw: f64,
    pub heat_pump_on: bool,
    pub heat_pump_kw: f64,
    pub batteries: Vec<BatterySlot>,
    pub evs: Vec<EvSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatterySlot {
    pub name: String,
    pub charge_kw: f64,
    pub discharge_kw: f64,
    pub soc_kwh: f64,
    pub soc_fraction: f64,
}

impl BatterySlot {
    pub fn mode(&self) -> BatteryMode {
        if self.charge_kw > ACTIVE_POWER_KW {
            BatteryMode::Charging
        } else if self.discharge_kw > ACTIVE_POWER_KW {
            BatteryMode::Discharging
        } else {
            BatteryMode::Idle
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvSlot {
    pub name: String,
    pub charge_kw: f64,
    pub soc_kwh: f64,
    pub soc_fraction: f64,
}

/// Horizon-wide totals of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub slots: usize,
    pub imported_kwh: f64,
    pub exported_kwh: f64,
    pub heat_pump_slots: usize,
    pub profit: f64,
    pub profit_currency: f64,
}

impl DispatchPlan {
    pub fn profit_currency(&self) -> f64 {
        self.profit * SLOT_HOURS
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            slots: self.slots.len(),
            imported_kwh: self.slots.iter().map(|s| s.grid_import_kw).sum::<f64>() * SLOT_HOURS,
            exported_kwh: self.slots.iter().map(|s| s.grid_export_kw).sum::<f64>() * SLOT_HOURS,
            heat_pump_slots: self.slots.iter().filter(|s| s.heat_pump_on).count(),
            profit: self.profit,
            profit_currency: self.profit_currency(),
        }
    }
}
