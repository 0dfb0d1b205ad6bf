use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use strum::Display;

use super::{OptimizerError, ParameterSnapshot};
use crate::domain::DispatchPlan;

/// Why a run produced no plan. These are regular outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case", tag = "reason")]
#[strum(serialize_all = "snake_case")]
pub enum NoPlanReason {
    Infeasible,
    Unbounded,
    HeatPumpRunTimeExceedsHorizon,
    EvTargetUnreachable { ev: usize },
}

#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Optimal(DispatchPlan),
    NoPlan(NoPlanReason),
}

impl SolveOutcome {
    pub fn plan(&self) -> Option<&DispatchPlan> {
        match self {
            SolveOutcome::Optimal(plan) => Some(plan),
            SolveOutcome::NoPlan(_) => None,
        }
    }

    pub fn into_plan(self) -> Option<DispatchPlan> {
        match self {
            SolveOutcome::Optimal(plan) => Some(plan),
            SolveOutcome::NoPlan(_) => None,
        }
    }
}

/// A dispatch algorithm. Implementations are synchronous and keep no state between calls.
pub trait DispatchStrategy: Send + Sync {
    fn solve(&self, params: &ParameterSnapshot) -> Result<SolveOutcome, OptimizerError>;
}

/// Runs a strategy off the async executor with an optional deadline.
#[derive(Clone)]
pub struct DispatchOptimizer {
    strategy: Arc<dyn DispatchStrategy>,
}

impl DispatchOptimizer {
    pub fn new(strategy: impl DispatchStrategy + 'static) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }

    pub fn solve(&self, params: &ParameterSnapshot) -> Result<SolveOutcome, OptimizerError> {
        self.strategy.solve(params)
    }

    /// Solve on the blocking pool. When `limit` expires the result is discarded and
    /// [`OptimizerError::TimedOut`] is returned; the blocking task runs to completion unobserved.
    pub async fn solve_with_timeout(
        &self,
        params: ParameterSnapshot,
        limit: Duration,
    ) -> Result<SolveOutcome, OptimizerError> {
        let strategy = Arc::clone(&self.strategy);
        let task = tokio::task::spawn_blocking(move || strategy.solve(&params));

        match tokio::time::timeout(limit, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => Err(OptimizerError::Task(join_err.to_string())),
            Err(_) => {
                tracing::warn!(?limit, "dispatch solve timed out, discarding result");
                Err(OptimizerError::TimedOut(limit))
            }
        }
    }
}
