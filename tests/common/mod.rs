#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use home_energy_dispatch::domain::{
    BatteryAsset, DispatchPlan, EvAsset, HeatPumpAsset, SLOT_HOURS,
};
use home_energy_dispatch::optimizer::{
    DispatchStrategy, MilpDispatchOptimizer, ParameterSnapshot, SolveOutcome,
};

pub const TOL: f64 = 1e-6;

/// Snapshot with no assets, flat prices and no load.
pub fn snapshot(n: usize) -> ParameterSnapshot {
    ParameterSnapshot {
        start_time: Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap(),
        time_periods: n,
        spot_prices: vec![0.2; n],
        max_grid_import: vec![10.0; n],
        max_grid_export: vec![10.0; n],
        solar_production: vec![0.0; n],
        house_consumption: vec![0.0; n],
        network_import_fee: 0.0,
        network_export_fee: 0.0,
        batteries: vec![],
        evs: vec![],
        heat_pump: HeatPumpAsset::default(),
    }
}

pub fn battery() -> BatteryAsset {
    BatteryAsset {
        name: "deye".into(),
        capacity_kwh: 10.0,
        min_soc_kwh: 2.0,
        max_charge_kw: 5.0,
        max_discharge_kw: 5.0,
        initial_soc_kwh: 5.0,
        charge_efficiency: 0.9,
        discharge_efficiency: 0.9,
    }
}

pub fn ev() -> EvAsset {
    EvAsset {
        name: "ID.3".into(),
        capacity_kwh: 58.0,
        initial_soc_kwh: 40.0,
        target_soc_kwh: 42.0,
        deadline_slot: 5,
        max_charge_kw: 11.0,
        min_charge_kw: 4.2,
    }
}

pub fn solve(params: &ParameterSnapshot) -> SolveOutcome {
    MilpDispatchOptimizer.solve(params).expect("solver failure")
}

pub fn solve_plan(params: &ParameterSnapshot) -> DispatchPlan {
    match solve(params) {
        SolveOutcome::Optimal(plan) => plan,
        SolveOutcome::NoPlan(reason) => panic!("expected an optimal plan, got {reason}"),
    }
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOL * a.abs().max(b.abs()).max(1.0)
}

/// Check every structural property a solved plan must satisfy.
pub fn assert_plan_properties(params: &ParameterSnapshot, plan: &DispatchPlan) {
    assert_eq!(plan.slots.len(), params.time_periods);

    for (t, slot) in plan.slots.iter().enumerate() {
        let battery_charge: f64 = slot.batteries.iter().map(|b| b.charge_kw).sum();
        let battery_discharge: f64 = slot.batteries.iter().map(|b| b.discharge_kw).sum();
        let ev_charge: f64 = slot.evs.iter().map(|e| e.charge_kw).sum();
        let supply = slot.grid_import_kw + battery_discharge + params.solar_production[t];
        let demand = slot.grid_export_kw
            + params.house_consumption[t]
            + battery_charge
            + ev_charge
            + slot.heat_pump_kw;
        assert!(close(supply, demand), "slot {t}: supply {supply} != demand {demand}");

        assert!(
            !(slot.grid_import_kw > TOL && slot.grid_export_kw > TOL),
            "slot {t} imports and exports"
        );
        assert!(slot.grid_import_kw <= params.max_grid_import[t] + TOL);
        assert!(slot.grid_export_kw <= params.max_grid_export[t] + TOL);

        for (i, (b, asset)) in slot.batteries.iter().zip(&params.batteries).enumerate() {
            assert!(
                !(b.charge_kw > TOL && b.discharge_kw > TOL),
                "battery {i} charges and discharges in slot {t}"
            );
            assert!(b.soc_kwh >= asset.min_soc_kwh - TOL, "battery {i} below min in slot {t}");
            assert!(b.soc_kwh <= asset.capacity_kwh + TOL, "battery {i} above capacity in slot {t}");

            let previous = if t == 0 {
                asset.initial_soc_kwh
            } else {
                plan.slots[t - 1].batteries[i].soc_kwh
            };
            let expected = previous + b.charge_kw * SLOT_HOURS * asset.charge_efficiency
                - b.discharge_kw * SLOT_HOURS / asset.discharge_efficiency;
            assert!(close(b.soc_kwh, expected), "battery {i} SoC drift in slot {t}");
        }

        for (i, (e, asset)) in slot.evs.iter().zip(&params.evs).enumerate() {
            assert!(e.soc_kwh >= -TOL && e.soc_kwh <= asset.capacity_kwh + TOL);
            assert!(
                e.charge_kw <= TOL || e.charge_kw >= asset.min_charge_kw - TOL,
                "ev {i} charges below the charger minimum in slot {t}"
            );
            assert!(e.charge_kw <= asset.max_charge_kw + TOL);
        }
    }

    for (i, asset) in params.evs.iter().enumerate() {
        let soc = plan.slots[asset.deadline_slot].evs[i].soc_kwh;
        assert!(soc >= asset.target_soc_kwh - TOL, "ev {i} misses its target");
    }

    let running = plan.slots.iter().filter(|s| s.heat_pump_on).count();
    assert!(running >= params.heat_pump.required_slots());
    for &t in &params.heat_pump.must_run_slots {
        assert!(plan.slots[t].heat_pump_on, "heat pump off in mandatory slot {t}");
    }

    let profit: f64 = plan
        .slots
        .iter()
        .map(|s| {
            s.grid_export_kw * (s.spot_price - params.network_export_fee)
                - s.grid_import_kw * (s.spot_price + params.network_import_fee)
        })
        .sum();
    assert!(close(plan.profit, profit));
}
