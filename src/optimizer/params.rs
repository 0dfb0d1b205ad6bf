use chrono::{DateTime, Utc};
use itertools::izip;
use serde::{Deserialize, Serialize};

use super::InputError;
use crate::domain::{BatteryAsset, EvAsset, HeatPumpAsset, Horizon, SlotForecast};

/// Immutable input of one optimizer run.
///
/// Per-slot series are kept as parallel arrays, the shape parameter assembly produces them
/// in. [`ParameterSnapshot::horizon`] checks them and zips them into a [`Horizon`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    /// Start of slot 0. Only used to timestamp the plan.
    pub start_time: DateTime<Utc>,
    pub time_periods: usize,
    pub spot_prices: Vec<f64>,
    pub max_grid_import: Vec<f64>,
    pub max_grid_export: Vec<f64>,
    pub solar_production: Vec<f64>,
    pub house_consumption: Vec<f64>,
    #[serde(default)]
    pub network_import_fee: f64,
    #[serde(default)]
    pub network_export_fee: f64,
    #[serde(default)]
    pub batteries: Vec<BatteryAsset>,
    #[serde(default)]
    pub evs: Vec<EvAsset>,
    #[serde(default)]
    pub heat_pump: HeatPumpAsset,
}

impl ParameterSnapshot {
    /// Validate the snapshot shape and build the slot horizon.
    pub fn horizon(&self) -> Result<Horizon, InputError> {
        let n = self.time_periods;
        if n == 0 {
            return Err(InputError::EmptyHorizon);
        }

        for (series, values) in self.series() {
            if values.len() != n {
                return Err(InputError::LengthMismatch {
                    series,
                    expected: n,
                    actual: values.len(),
                });
            }
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(InputError::NonFinite { series, index });
            }
        }

        for (fee, value) in [
            ("network_import_fee", self.network_import_fee),
            ("network_export_fee", self.network_export_fee),
        ] {
            if !value.is_finite() {
                return Err(InputError::NonFiniteFee { fee });
            }
        }

        let assets = self
            .batteries
            .iter()
            .enumerate()
            .flat_map(|(i, b)| battery_fields(b).map(|(field, v)| ("battery", i, field, v)))
            .chain(
                self.evs
                    .iter()
                    .enumerate()
                    .flat_map(|(i, e)| ev_fields(e).map(|(field, v)| ("ev", i, field, v))),
            )
            .chain([("heat_pump", 0, "power_kw", self.heat_pump.power_kw)]);
        for (asset, index, field, value) in assets {
            if !value.is_finite() {
                return Err(InputError::NonFiniteAsset {
                    asset,
                    index,
                    field,
                });
            }
        }

        for (battery, b) in self.batteries.iter().enumerate() {
            for (which, value) in [
                ("charge", b.charge_efficiency),
                ("discharge", b.discharge_efficiency),
            ] {
                if !(value > 0.0 && value <= 1.0) {
                    return Err(InputError::EfficiencyOutOfRange {
                        battery,
                        which,
                        value,
                    });
                }
            }
        }

        for (ev, e) in self.evs.iter().enumerate() {
            if e.deadline_slot >= n {
                return Err(InputError::DeadlineOutOfRange {
                    ev,
                    slot: e.deadline_slot,
                    time_periods: n,
                });
            }
        }

        if let Some(&slot) = self.heat_pump.must_run_slots.iter().find(|&&s| s >= n) {
            return Err(InputError::MandatorySlotOutOfRange {
                slot,
                time_periods: n,
            });
        }

        let slots = izip!(
            &self.spot_prices,
            &self.max_grid_import,
            &self.max_grid_export,
            &self.solar_production,
            &self.house_consumption
        )
        .map(
            |(&spot_price, &max_grid_import_kw, &max_grid_export_kw, &solar_kw, &consumption_kw)| {
                SlotForecast {
                    spot_price,
                    max_grid_import_kw,
                    max_grid_export_kw,
                    solar_kw,
                    consumption_kw,
                }
            },
        )
        .collect();

        Ok(Horizon::new(self.start_time, slots))
    }

    fn series(&self) -> [(&'static str, &[f64]); 5] {
        [
            ("spot_prices", self.spot_prices.as_slice()),
            ("max_grid_import", self.max_grid_import.as_slice()),
            ("max_grid_export", self.max_grid_export.as_slice()),
            ("solar_production", self.solar_production.as_slice()),
            ("house_consumption", self.house_consumption.as_slice()),
        ]
    }
}

fn battery_fields(b: &BatteryAsset) -> [(&'static str, f64); 7] {
    [
        ("capacity_kwh", b.capacity_kwh),
        ("min_soc_kwh", b.min_soc_kwh),
        ("max_charge_kw", b.max_charge_kw),
        ("max_discharge_kw", b.max_discharge_kw),
        ("initial_soc_kwh", b.initial_soc_kwh),
        ("charge_efficiency", b.charge_efficiency),
        ("discharge_efficiency", b.discharge_efficiency),
    ]
}

fn ev_fields(e: &EvAsset) -> [(&'static str, f64); 5] {
    [
        ("capacity_kwh", e.capacity_kwh),
        ("initial_soc_kwh", e.initial_soc_kwh),
        ("target_soc_kwh", e.target_soc_kwh),
        ("max_charge_kw", e.max_charge_kw),
        ("min_charge_kw", e.min_charge_kw),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn snapshot(n: usize) -> ParameterSnapshot {
        ParameterSnapshot {
            start_time: Utc::now(),
            time_periods: n,
            spot_prices: vec![0.2; n],
            max_grid_import: vec![10.0; n],
            max_grid_export: vec![10.0; n],
            solar_production: vec![0.0; n],
            house_consumption: vec![1.0; n],
            network_import_fee: 0.0,
            network_export_fee: 0.0,
            batteries: vec![],
            evs: vec![],
            heat_pump: HeatPumpAsset::default(),
        }
    }

    fn battery(charge_efficiency: f64, discharge_efficiency: f64) -> BatteryAsset {
        BatteryAsset {
            name: "house".into(),
            capacity_kwh: 10.0,
            min_soc_kwh: 0.0,
            max_charge_kw: 5.0,
            max_discharge_kw: 5.0,
            initial_soc_kwh: 5.0,
            charge_efficiency,
            discharge_efficiency,
        }
    }

    #[test]
    fn builds_horizon_in_slot_order() {
        let mut params = snapshot(3);
        params.spot_prices = vec![0.1, 0.2, 0.3];
        let horizon = params.horizon().unwrap();
        assert_eq!(horizon.len(), 3);
        assert_eq!(horizon.slot(2).spot_price, 0.3);
        assert_eq!(horizon.slot(1).consumption_kw, 1.0);
    }

    #[test]
    fn rejects_empty_horizon() {
        assert_eq!(snapshot(0).horizon(), Err(InputError::EmptyHorizon));
    }

    #[test]
    fn names_the_mismatched_series() {
        let mut params = snapshot(4);
        params.solar_production.pop();
        assert_eq!(
            params.horizon(),
            Err(InputError::LengthMismatch {
                series: "solar_production",
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn rejects_nan_forecasts() {
        let mut params = snapshot(2);
        params.house_consumption[1] = f64::NAN;
        assert_eq!(
            params.horizon(),
            Err(InputError::NonFinite {
                series: "house_consumption",
                index: 1
            })
        );
    }

    #[rstest]
    #[case::import_fee(|p: &mut ParameterSnapshot| p.network_import_fee = f64::NAN, "network_import_fee")]
    #[case::export_fee(|p: &mut ParameterSnapshot| p.network_export_fee = f64::INFINITY, "network_export_fee")]
    fn rejects_non_finite_fees(
        #[case] tweak: fn(&mut ParameterSnapshot),
        #[case] fee: &'static str,
    ) {
        let mut params = snapshot(2);
        tweak(&mut params);
        assert_eq!(params.horizon(), Err(InputError::NonFiniteFee { fee }));
    }

    #[rstest]
    #[case::battery_capacity(|p: &mut ParameterSnapshot| p.batteries[0].capacity_kwh = f64::NAN, "battery", "capacity_kwh")]
    #[case::battery_efficiency(|p: &mut ParameterSnapshot| p.batteries[0].charge_efficiency = f64::NAN, "battery", "charge_efficiency")]
    #[case::ev_target(|p: &mut ParameterSnapshot| p.evs[0].target_soc_kwh = f64::NAN, "ev", "target_soc_kwh")]
    #[case::ev_min_rate(|p: &mut ParameterSnapshot| p.evs[0].min_charge_kw = f64::NEG_INFINITY, "ev", "min_charge_kw")]
    #[case::heat_pump_power(|p: &mut ParameterSnapshot| p.heat_pump.power_kw = f64::NAN, "heat_pump", "power_kw")]
    fn rejects_non_finite_asset_fields(
        #[case] tweak: fn(&mut ParameterSnapshot),
        #[case] expected_asset: &str,
        #[case] expected_field: &str,
    ) {
        let mut params = snapshot(4);
        params.batteries.push(battery(0.9, 0.9));
        params.evs.push(EvAsset {
            name: "car".into(),
            capacity_kwh: 50.0,
            initial_soc_kwh: 10.0,
            target_soc_kwh: 12.0,
            deadline_slot: 3,
            max_charge_kw: 11.0,
            min_charge_kw: 4.2,
        });
        tweak(&mut params);
        match params.horizon() {
            Err(InputError::NonFiniteAsset { asset, index, field }) => {
                assert_eq!(asset, expected_asset);
                assert_eq!(index, 0);
                assert_eq!(field, expected_field);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[rstest]
    #[case(0.0, 0.9, "charge")]
    #[case(0.9, 1.2, "discharge")]
    #[case(-0.5, 0.9, "charge")]
    fn rejects_efficiency_outside_unit_interval(
        #[case] charge: f64,
        #[case] discharge: f64,
        #[case] expected_which: &str,
    ) {
        let mut params = snapshot(2);
        params.batteries.push(battery(charge, discharge));
        match params.horizon() {
            Err(InputError::EfficiencyOutOfRange { which, .. }) => {
                assert_eq!(which, expected_which)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn accepts_unit_efficiency() {
        let mut params = snapshot(2);
        params.batteries.push(battery(1.0, 1.0));
        assert!(params.horizon().is_ok());
    }

    #[test]
    fn rejects_deadline_past_horizon() {
        let mut params = snapshot(4);
        params.evs.push(EvAsset {
            name: "car".into(),
            capacity_kwh: 50.0,
            initial_soc_kwh: 10.0,
            target_soc_kwh: 20.0,
            deadline_slot: 4,
            max_charge_kw: 11.0,
            min_charge_kw: 4.2,
        });
        assert_eq!(
            params.horizon(),
            Err(InputError::DeadlineOutOfRange {
                ev: 0,
                slot: 4,
                time_periods: 4
            })
        );
    }

    #[test]
    fn rejects_must_run_slot_past_horizon() {
        let mut params = snapshot(4);
        params.heat_pump.must_run_slots = vec![1, 9];
        assert_eq!(
            params.horizon(),
            Err(InputError::MandatorySlotOutOfRange {
                slot: 9,
                time_periods: 4
            })
        );
    }

    #[test]
    fn deserializes_with_asset_defaults() {
        let json = r#"{
            "start_time": "2026-10-18T00:00:00Z",
            "time_periods": 1,
            "spot_prices": [0.2],
            "max_grid_import": [10.0],
            "max_grid_export": [10.0],
            "solar_production": [0.0],
            "house_consumption": [1.0]
        }"#;
        let params: ParameterSnapshot = serde_json::from_str(json).unwrap();
        assert!(params.batteries.is_empty());
        assert_eq!(params.heat_pump.run_hours, 0);
        assert!(params.horizon().is_ok());
    }
}
