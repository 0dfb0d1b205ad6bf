//! MILP (Mixed-Integer Linear Programming) dispatch optimizer
//!
//! Schedules grid exchange, batteries, EVs and a heat pump over a horizon of 15-minute slots
//! so that the scored grid exchange is maximal. Per slot the formulation has:
//! - grid import/export, bounded by the slot's capacities, with a binary "importing"
//!   indicator so a slot never imports and exports at once
//! - battery charge/discharge powers, each gated by its own binary indicator, the two
//!   indicators mutually exclusive, and an SoC variable bounded by [min, capacity]
//! - EV charge power that is either zero or between the charger minimum and maximum
//! - a binary heat pump state drawing its fixed power
//!
//! tied together by the per-slot power balance, SoC evolution, the heat pump run time and the
//! EV deadline targets.

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use std::time::Instant;
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::domain::{
    BatteryAsset, BatterySlot, DispatchPlan, EvAsset, EvSlot, HeatPumpAsset, Horizon, SlotPlan,
    SLOT_HOURS,
};
use crate::optimizer::{
    DispatchStrategy, NoPlanReason, OptimizerError, ParameterSnapshot, SolveOutcome,
};

/// Binary values above this read as 1.
const BINARY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct MilpDispatchOptimizer;

impl DispatchStrategy for MilpDispatchOptimizer {
    fn solve(&self, params: &ParameterSnapshot) -> Result<SolveOutcome, OptimizerError> {
        let horizon = params.horizon()?;
        let span = info_span!(
            "milp_dispatch",
            slots = horizon.len(),
            batteries = params.batteries.len(),
            evs = params.evs.len()
        );
        let _guard = span.enter();

        if let Some(reason) = precheck(&horizon, params) {
            info!(%reason, "no dispatch plan");
            return Ok(SolveOutcome::NoPlan(reason));
        }

        let started = Instant::now();
        let mut problem = ProblemVariables::new();
        let vars = DispatchVariables::declare(&mut problem, &horizon, params);
        let objective = vars.objective(&horizon, params);
        let constraints = vars.constraints(&horizon, params);
        debug!(constraints = constraints.len(), "MILP model built");

        let mut model = problem.maximise(objective).using(microlp);
        for c in constraints {
            model = model.with(c);
        }

        match model.solve() {
            Ok(solution) => {
                let plan = vars.extract(&solution, &horizon, params);
                info!(
                    profit = plan.profit,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "optimal dispatch plan found"
                );
                Ok(SolveOutcome::Optimal(plan))
            }
            Err(ResolutionError::Infeasible) => {
                info!(reason = %NoPlanReason::Infeasible, "no dispatch plan");
                Ok(SolveOutcome::NoPlan(NoPlanReason::Infeasible))
            }
            Err(ResolutionError::Unbounded) => {
                info!(reason = %NoPlanReason::Unbounded, "no dispatch plan");
                Ok(SolveOutcome::NoPlan(NoPlanReason::Unbounded))
            }
            Err(e) => Err(OptimizerError::Solver(e.to_string())),
        }
    }
}

/// Cheap arithmetic checks for inputs that can never yield a plan.
fn precheck(horizon: &Horizon, params: &ParameterSnapshot) -> Option<NoPlanReason> {
    if params.heat_pump.required_slots() > horizon.len() {
        return Some(NoPlanReason::HeatPumpRunTimeExceedsHorizon);
    }

    params
        .evs
        .iter()
        .position(|ev| ev.best_case_soc_at_deadline(SLOT_HOURS) < ev.target_soc_kwh)
        .map(|ev| NoPlanReason::EvTargetUnreachable { ev })
}

struct BatteryVars {
    charge: Vec<Variable>,
    discharge: Vec<Variable>,
    soc: Vec<Variable>,
    charging: Vec<Variable>,
    discharging: Vec<Variable>,
}

struct EvVars {
    charge: Vec<Variable>,
    soc: Vec<Variable>,
    charging: Vec<Variable>,
}

struct DispatchVariables {
    grid_import: Vec<Variable>,
    grid_export: Vec<Variable>,
    importing: Vec<Variable>,
    heat_pump_on: Vec<Variable>,
    batteries: Vec<BatteryVars>,
    evs: Vec<EvVars>,
}

impl DispatchVariables {
    fn declare(problem: &mut ProblemVariables, horizon: &Horizon, params: &ParameterSnapshot) -> Self {
        let n = horizon.len();
        let slots = horizon.slots();

        let grid_import = slots
            .iter()
            .map(|s| problem.add(variable().min(0.0).max(s.max_grid_import_kw)))
            .collect();
        let grid_export = slots
            .iter()
            .map(|s| problem.add(variable().min(0.0).max(s.max_grid_export_kw)))
            .collect();
        let importing = problem.add_vector(variable().binary(), n);
        let heat_pump_on = problem.add_vector(variable().binary(), n);

        let batteries = params
            .batteries
            .iter()
            .map(|b| BatteryVars {
                charge: problem.add_vector(variable().min(0.0).max(b.max_charge_kw), n),
                discharge: problem.add_vector(variable().min(0.0).max(b.max_discharge_kw), n),
                soc: problem.add_vector(variable().min(b.min_soc_kwh).max(b.capacity_kwh), n),
                charging: problem.add_vector(variable().binary(), n),
                discharging: problem.add_vector(variable().binary(), n),
            })
            .collect();

        let evs = params
            .evs
            .iter()
            .map(|e| EvVars {
                charge: problem.add_vector(variable().min(0.0).max(e.max_charge_kw), n),
                soc: problem.add_vector(variable().min(0.0).max(e.capacity_kwh), n),
                charging: problem.add_vector(variable().binary(), n),
            })
            .collect();

        Self {
            grid_import,
            grid_export,
            importing,
            heat_pump_on,
            batteries,
            evs,
        }
    }

    /// Σ export·(price − export fee) − import·(price + import fee), in power units.
    fn objective(&self, horizon: &Horizon, params: &ParameterSnapshot) -> Expression {
        let mut objective = Expression::from(0.0);
        for (t, slot) in horizon.slots().iter().enumerate() {
            objective += (slot.spot_price - params.network_export_fee) * self.grid_export[t];
            objective -= (slot.spot_price + params.network_import_fee) * self.grid_import[t];
        }
        objective
    }

    fn constraints(&self, horizon: &Horizon, params: &ParameterSnapshot) -> Vec<good_lp::Constraint> {
        let mut out = Vec::new();

        for (t, slot) in horizon.slots().iter().enumerate() {
            // Grid exclusivity: import only while importing, export only while not
            out.push(constraint!(
                self.grid_import[t] <= slot.max_grid_import_kw * self.importing[t]
            ));
            out.push(constraint!(
                self.grid_export[t] + slot.max_grid_export_kw * self.importing[t]
                    <= slot.max_grid_export_kw
            ));

            let mut supply = Expression::from(self.grid_import[t]);
            supply += slot.solar_kw;
            let mut demand = Expression::from(self.grid_export[t]);
            demand += slot.consumption_kw;
            demand += params.heat_pump.power_kw * self.heat_pump_on[t];

            for (vars, battery) in self.batteries.iter().zip(&params.batteries) {
                supply += vars.discharge[t];
                demand += vars.charge[t];
                battery_slot_constraints(&mut out, vars, battery, t);
            }
            for (vars, ev) in self.evs.iter().zip(&params.evs) {
                demand += vars.charge[t];
                ev_slot_constraints(&mut out, vars, ev, t);
            }

            out.push(constraint!(supply == demand));
        }

        heat_pump_constraints(&mut out, &self.heat_pump_on, &params.heat_pump);

        for (vars, ev) in self.evs.iter().zip(&params.evs) {
            out.push(constraint!(vars.soc[ev.deadline_slot] >= ev.target_soc_kwh));
        }

        out
    }

    fn extract<S: Solution>(
        &self,
        solution: &S,
        horizon: &Horizon,
        params: &ParameterSnapshot,
    ) -> DispatchPlan {
        let power = |v: Variable| solution.value(v).max(0.0);
        let on = |v: Variable| solution.value(v) > BINARY_THRESHOLD;

        let mut profit = 0.0;
        let mut slots = Vec::with_capacity(horizon.len());
        for (t, slot) in horizon.slots().iter().enumerate() {
            let grid_import_kw = power(self.grid_import[t]);
            let grid_export_kw = power(self.grid_export[t]);
            profit += grid_export_kw * (slot.spot_price - params.network_export_fee)
                - grid_import_kw * (slot.spot_price + params.network_import_fee);

            let heat_pump_on = on(self.heat_pump_on[t]);
            slots.push(SlotPlan {
                time: horizon.slot_start(t),
                spot_price: slot.spot_price,
                predicted_solar_kw: slot.solar_kw,
                house_consumption_kw: slot.consumption_kw,
                grid_import_kw,
                grid_export_kw,
                heat_pump_on,
                heat_pump_kw: if heat_pump_on { params.heat_pump.power_kw } else { 0.0 },
                batteries: self
                    .batteries
                    .iter()
                    .zip(&params.batteries)
                    .map(|(vars, battery)| {
                        let soc_kwh = solution.value(vars.soc[t]);
                        BatterySlot {
                            name: battery.name.clone(),
                            charge_kw: power(vars.charge[t]),
                            discharge_kw: power(vars.discharge[t]),
                            soc_kwh,
                            soc_fraction: battery.soc_fraction(soc_kwh),
                        }
                    })
                    .collect(),
                evs: self
                    .evs
                    .iter()
                    .zip(&params.evs)
                    .map(|(vars, ev)| {
                        let soc_kwh = solution.value(vars.soc[t]);
                        EvSlot {
                            name: ev.name.clone(),
                            charge_kw: power(vars.charge[t]),
                            soc_kwh,
                            soc_fraction: ev.soc_fraction(soc_kwh),
                        }
                    })
                    .collect(),
            });
        }

        DispatchPlan {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            profit,
            slots,
        }
    }
}

fn battery_slot_constraints(
    out: &mut Vec<good_lp::Constraint>,
    vars: &BatteryVars,
    battery: &BatteryAsset,
    t: usize,
) {
    out.push(constraint!(vars.charging[t] + vars.discharging[t] <= 1.0));
    out.push(constraint!(
        vars.charge[t] <= battery.max_charge_kw * vars.charging[t]
    ));
    out.push(constraint!(
        vars.discharge[t] <= battery.max_discharge_kw * vars.discharging[t]
    ));

    // soc[t] = soc[t-1] + charge·Δh·ηc − discharge·Δh/ηd
    let previous = if t == 0 {
        Expression::from(battery.initial_soc_kwh)
    } else {
        Expression::from(vars.soc[t - 1])
    };
    let stored = (SLOT_HOURS * battery.charge_efficiency) * vars.charge[t];
    let drawn = (SLOT_HOURS / battery.discharge_efficiency) * vars.discharge[t];
    out.push(constraint!(vars.soc[t] == previous + stored - drawn));
}

fn ev_slot_constraints(out: &mut Vec<good_lp::Constraint>, vars: &EvVars, ev: &EvAsset, t: usize) {
    out.push(constraint!(
        vars.charge[t] >= ev.min_charge_kw * vars.charging[t]
    ));
    out.push(constraint!(
        vars.charge[t] <= ev.max_charge_kw * vars.charging[t]
    ));

    let previous = if t == 0 {
        Expression::from(ev.initial_soc_kwh)
    } else {
        Expression::from(vars.soc[t - 1])
    };
    out.push(constraint!(
        vars.soc[t] == previous + SLOT_HOURS * vars.charge[t]
    ));
}

fn heat_pump_constraints(
    out: &mut Vec<good_lp::Constraint>,
    on: &[Variable],
    heat_pump: &HeatPumpAsset,
) {
    let running: Expression = on.iter().copied().sum();
    let required = heat_pump.required_slots() as f64;
    out.push(constraint!(running >= required));
    for &t in &heat_pump.must_run_slots {
        out.push(constraint!(on[t] == 1.0));
    }
}
