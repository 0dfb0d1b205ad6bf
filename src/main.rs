use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use home_energy_dispatch::{assembly, config, optimizer, telemetry};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{info, warn};

use assembly::{JsonFile, SnapshotAssembler};
use config::Config;
use optimizer::{
    DispatchOptimizer, MilpDispatchOptimizer, OptimizerError, ParameterSnapshot, SolveOutcome,
};

/// Exit status when the optimizer finds no plan.
const EXIT_NO_PLAN: u8 = 2;

#[derive(Debug, Parser)]
#[command(version, about = "Plan grid, battery, EV and heat pump dispatch for the coming day")]
struct Args {
    /// Configuration file
    #[arg(long, env = "DISPATCH_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Solve this parameter snapshot (JSON) instead of assembling one from the configured inputs
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Pretty-print the plan
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let args = Args::parse();
    let cfg = Config::load_from(&args.config)?;

    let params = match &args.snapshot {
        Some(path) => read_snapshot(path).await?,
        None => {
            let assembler = SnapshotAssembler::new(
                cfg.clone(),
                Box::new(JsonFile::new(&cfg.inputs.prices_path)),
                Box::new(JsonFile::new(&cfg.inputs.solar_path)),
                Box::new(JsonFile::new(&cfg.inputs.telemetry_path)),
            )?;
            assembler.assemble(Utc::now()).await?
        }
    };

    info!(
        start = %params.start_time,
        slots = params.time_periods,
        batteries = params.batteries.len(),
        evs = params.evs.len(),
        "starting dispatch optimization"
    );

    let optimizer = DispatchOptimizer::new(MilpDispatchOptimizer);
    let outcome = tokio::select! {
        outcome = optimizer.solve_with_timeout(params, cfg.solver.timeout()) => match outcome {
            Err(OptimizerError::InvalidInput(e)) => {
                warn!(error = %e, "rejected parameter snapshot");
                return Err(OptimizerError::InvalidInput(e).into());
            }
            other => other?,
        },
        _ = telemetry::shutdown_signal() => {
            warn!("interrupted, discarding solve");
            return Ok(ExitCode::FAILURE);
        }
    };

    match outcome {
        SolveOutcome::Optimal(plan) => {
            let summary = plan.summary();
            info!(
                imported_kwh = summary.imported_kwh,
                exported_kwh = summary.exported_kwh,
                heat_pump_slots = summary.heat_pump_slots,
                profit = summary.profit,
                profit_currency = summary.profit_currency,
                "dispatch plan ready"
            );
            let json = if args.pretty {
                serde_json::to_string_pretty(&plan)?
            } else {
                serde_json::to_string(&plan)?
            };
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        SolveOutcome::NoPlan(reason) => {
            warn!(%reason, "no dispatch plan for this horizon");
            Ok(ExitCode::from(EXIT_NO_PLAN))
        }
    }
}

async fn read_snapshot(path: &Path) -> Result<ParameterSnapshot> {
    let body = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("failed to parse snapshot {}", path.display()))
}
