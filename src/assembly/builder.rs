use anyhow::{bail, Context, Result};
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use super::{
    quarter_hour_solar, slot_prices, BatteryReading, BatteryTelemetry, PriceForecaster,
    PricePoint, SolarEstimate, SolarForecaster,
};
use crate::config::Config;
use crate::domain::{floor_to_slot, slot_duration, BatteryAsset, EvAsset, HeatPumpAsset};
use crate::optimizer::ParameterSnapshot;

/// Gathers forecasts and live readings into one parameter snapshot.
pub struct SnapshotAssembler {
    config: Config,
    tz: Tz,
    prices: Box<dyn PriceForecaster>,
    solar: Box<dyn SolarForecaster>,
    telemetry: Box<dyn BatteryTelemetry>,
}

impl SnapshotAssembler {
    pub fn new(
        config: Config,
        prices: Box<dyn PriceForecaster>,
        solar: Box<dyn SolarForecaster>,
        telemetry: Box<dyn BatteryTelemetry>,
    ) -> Result<Self> {
        let tz = config.tz()?;
        Ok(Self {
            config,
            tz,
            prices,
            solar,
            telemetry,
        })
    }

    /// Snapshot for a horizon beginning at the slot containing `now`.
    pub async fn assemble(&self, now: DateTime<Utc>) -> Result<ParameterSnapshot> {
        let (prices, solar, readings) = tokio::try_join!(
            self.prices.day_ahead_prices(),
            self.solar.solar_forecast(),
            self.telemetry.battery_readings(),
        )?;
        build_snapshot(&self.config, self.tz, now, &prices, &solar, &readings)
    }
}

pub fn build_snapshot(
    config: &Config,
    tz: Tz,
    now: DateTime<Utc>,
    prices: &[PricePoint],
    solar: &[SolarEstimate],
    readings: &[BatteryReading],
) -> Result<ParameterSnapshot> {
    let start = floor_to_slot(now);
    let spot_prices = slot_prices(prices, start);
    let n = spot_prices.len();
    if n == 0 {
        bail!("no day-ahead prices cover {start}");
    }
    debug!(%start, slots = n, "assembling dispatch horizon");

    let quarters = quarter_hour_solar(solar).context("solar forecast")?;
    let solar_production = slot_starts(start, n)
        .map(|t| match quarters.get(&t) {
            Some(kw) => *kw,
            None => {
                warn!(slot = %t, "no solar estimate for slot, assuming 0 kW");
                0.0
            }
        })
        .collect();

    let evs = config
        .evs
        .iter()
        .map(|ev| EvAsset {
            name: ev.name.clone(),
            capacity_kwh: ev.capacity_kwh,
            initial_soc_kwh: ev.initial_soc_kwh,
            target_soc_kwh: ev.target_soc_kwh,
            deadline_slot: ev
                .ready_by_hour
                .map_or(n - 1, |hour| ready_by_slot(start, n, tz, hour)),
            max_charge_kw: ev.max_charge_kw,
            min_charge_kw: ev.min_charge_kw,
        })
        .collect();

    Ok(ParameterSnapshot {
        start_time: start,
        time_periods: n,
        spot_prices,
        max_grid_import: vec![config.grid.max_import_kw; n],
        max_grid_export: vec![config.grid.max_export_kw; n],
        solar_production,
        house_consumption: vec![config.house.baseline_consumption_kw; n],
        network_import_fee: config.grid.import_fee,
        network_export_fee: config.grid.export_fee,
        batteries: battery_assets(config, readings)?,
        evs,
        heat_pump: HeatPumpAsset {
            power_kw: config.heat_pump.power_kw,
            run_hours: config.heat_pump.run_hours,
            must_run_slots: slots_at_local_hours(start, n, tz, &config.heat_pump.must_run_hours),
        },
    })
}

fn battery_assets(config: &Config, readings: &[BatteryReading]) -> Result<Vec<BatteryAsset>> {
    for battery in &config.batteries {
        if !readings.iter().any(|r| r.name == battery.name) {
            warn!(battery = %battery.name, "no telemetry for configured battery, leaving it out");
        }
    }

    readings
        .iter()
        .map(|reading| {
            let limits = config
                .batteries
                .iter()
                .find(|b| b.name == reading.name)
                .with_context(|| format!("telemetry for unconfigured battery {:?}", reading.name))?;
            Ok(BatteryAsset {
                name: reading.name.clone(),
                capacity_kwh: reading.capacity_kwh,
                min_soc_kwh: limits.min_soc_kwh,
                max_charge_kw: limits.max_charge_kw,
                max_discharge_kw: limits.max_discharge_kw,
                initial_soc_kwh: reading.soc_kwh,
                charge_efficiency: limits.charge_efficiency,
                discharge_efficiency: limits.discharge_efficiency,
            })
        })
        .collect()
}

fn slot_starts(start: DateTime<Utc>, n: usize) -> impl Iterator<Item = DateTime<Utc>> {
    (0..n).map(move |t| start + slot_duration() * t as i32)
}

/// Slots whose local start hour is one of `hours`.
pub fn slots_at_local_hours(start: DateTime<Utc>, n: usize, tz: Tz, hours: &[u32]) -> Vec<usize> {
    slot_starts(start, n)
        .enumerate()
        .filter(|(_, t)| hours.contains(&t.with_timezone(&tz).hour()))
        .map(|(i, _)| i)
        .collect()
}

/// Deadline slot for a local "ready by" hour: the slot right before the first later slot that
/// starts exactly at that hour, or the last slot when the horizon never reaches it.
pub fn ready_by_slot(start: DateTime<Utc>, n: usize, tz: Tz, hour: u32) -> usize {
    slot_starts(start, n)
        .enumerate()
        .skip(1)
        .find(|(_, t)| {
            let local = t.with_timezone(&tz);
            local.hour() == hour && local.minute() == 0
        })
        .map_or(n - 1, |(i, _)| i - 1)
}
