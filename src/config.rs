use anyhow::{Context, Result};
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::{path::Path, path::PathBuf, time::Duration};
use validator::Validate;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[validate(nested)]
    pub grid: GridConfig,
    #[validate(nested)]
    pub house: HouseConfig,
    #[serde(default)]
    #[validate(nested)]
    pub batteries: Vec<BatteryConfig>,
    #[serde(default)]
    #[validate(nested)]
    pub evs: Vec<EvConfig>,
    #[serde(default)]
    #[validate(nested)]
    pub heat_pump: HeatPumpConfig,
    #[serde(default)]
    #[validate(nested)]
    pub solver: SolverConfig,
    pub inputs: InputsConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GridConfig {
    #[validate(range(min = 0.0))]
    pub import_fee: f64,
    #[validate(range(min = 0.0))]
    pub export_fee: f64,
    #[validate(range(min = 0.0))]
    pub max_import_kw: f64,
    #[validate(range(min = 0.0))]
    pub max_export_kw: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HouseConfig {
    #[validate(range(min = 0.0))]
    pub baseline_consumption_kw: f64,
}

/// Static limits of a battery; capacity and SoC come from telemetry.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatteryConfig {
    pub name: String,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub charge_efficiency: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub discharge_efficiency: f64,
    #[validate(range(min = 0.0))]
    pub max_charge_kw: f64,
    #[validate(range(min = 0.0))]
    pub max_discharge_kw: f64,
    #[validate(range(min = 0.0))]
    pub min_soc_kwh: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EvConfig {
    pub name: String,
    #[validate(range(min = 0.0))]
    pub capacity_kwh: f64,
    #[validate(range(min = 0.0))]
    pub initial_soc_kwh: f64,
    #[validate(range(min = 0.0))]
    pub target_soc_kwh: f64,
    #[validate(range(min = 0.0))]
    pub max_charge_kw: f64,
    #[validate(range(min = 0.0))]
    pub min_charge_kw: f64,
    /// Local hour of day by which the target must be reached; end of horizon when unset.
    #[validate(range(max = 23))]
    pub ready_by_hour: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct HeatPumpConfig {
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub power_kw: f64,
    #[serde(default)]
    #[validate(range(max = 24))]
    pub run_hours: u32,
    /// Local hours of day during which the heat pump must run.
    #[serde(default)]
    pub must_run_hours: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SolverConfig {
    #[validate(range(min = 1))]
    pub timeout_seconds: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl SolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    pub prices_path: PathBuf,
    pub solar_path: PathBuf,
    pub telemetry_path: PathBuf,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DISPATCH__").split("__"));
        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract().context("failed to load configuration")?;
        cfg.validate().context("invalid configuration")?;
        if let Some(hour) = cfg.heat_pump.must_run_hours.iter().find(|h| **h > 23) {
            anyhow::bail!("invalid configuration: heat pump must-run hour {hour} is not 0..=23");
        }
        cfg.tz()?;
        Ok(cfg)
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {}", self.timezone, e))
    }
}
