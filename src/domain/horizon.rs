use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

/// Length of one optimization slot in minutes.
pub const SLOT_MINUTES: i64 = 15;

/// Slots per hour, used to turn run-hour requirements into slot counts.
pub const SLOTS_PER_HOUR: u32 = (60 / SLOT_MINUTES) as u32;

/// Slot duration in hours (Δh in the state-of-charge equations).
pub const SLOT_HOURS: f64 = SLOT_MINUTES as f64 / 60.0;

pub fn slot_duration() -> Duration {
    Duration::minutes(SLOT_MINUTES)
}

/// Floor a timestamp to the beginning of its slot.
pub fn floor_to_slot(t: DateTime<Utc>) -> DateTime<Utc> {
    // duration_trunc only fails for out-of-range timestamps
    t.duration_trunc(slot_duration()).unwrap_or(t)
}

/// Exogenous inputs for a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotForecast {
    pub spot_price: f64,
    pub max_grid_import_kw: f64,
    pub max_grid_export_kw: f64,
    pub solar_kw: f64,
    pub consumption_kw: f64,
}

/// Ordered, immutable sequence of equal-length slots starting at `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horizon {
    start: DateTime<Utc>,
    slots: Vec<SlotForecast>,
}

impl Horizon {
    pub fn new(start: DateTime<Utc>, slots: Vec<SlotForecast>) -> Self {
        Self { start, slots }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[SlotForecast] {
        &self.slots
    }

    pub fn slot(&self, t: usize) -> &SlotForecast {
        &self.slots[t]
    }

    /// Wall-clock start of slot `t`.
    pub fn slot_start(&self, t: usize) -> DateTime<Utc> {
        self.start + slot_duration() * t as i32
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.slot_start(self.slots.len())
    }
}
