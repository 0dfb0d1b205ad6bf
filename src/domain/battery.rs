use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Parameters of one stationary battery for a single optimization run.
///
/// All energies are in kWh and all powers in kW. Efficiencies are fractions in (0, 1] and
/// are applied asymmetrically: `charge_efficiency` shrinks the energy stored per kWh drawn,
/// `discharge_efficiency` grows the energy drawn from storage per kWh delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryAsset {
    #[serde(default)]
    pub name: String,
    pub capacity_kwh: f64,
    pub min_soc_kwh: f64,
    pub max_charge_kw: f64,
    pub max_discharge_kw: f64,
    pub initial_soc_kwh: f64,
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
}

impl BatteryAsset {
    pub fn soc_fraction(&self, soc_kwh: f64) -> f64 {
        if self.capacity_kwh > 0.0 {
            soc_kwh / self.capacity_kwh
        } else {
            0.0
        }
    }
}

/// Operating mode of a battery in one slot, inferred from its solved powers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BatteryMode {
    Charging,
    Discharging,
    Idle,
}
