use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use super::SolarEstimate;

const SUPPORTED_PERIOD: &str = "PT30M";

/// Split 30-minute solar estimates into quarter-hour values keyed by quarter start.
///
/// The second quarter of a period takes that period's estimate. The first quarter takes the
/// mean of the previous and current estimates, which smooths the step between periods.
pub fn quarter_hour_solar(estimates: &[SolarEstimate]) -> Result<BTreeMap<DateTime<Utc>, f64>> {
    let mut sorted: Vec<&SolarEstimate> = estimates.iter().collect();
    sorted.sort_by_key(|e| e.period_end);

    let mut quarters = BTreeMap::new();
    let mut previous: Option<f64> = None;
    for estimate in sorted {
        if estimate.period != SUPPORTED_PERIOD {
            bail!(
                "unsupported solar forecast period {:?}, expected {SUPPORTED_PERIOD}",
                estimate.period
            );
        }
        let current = estimate.pv_estimate_kw.max(0.0);
        let first = previous.map_or(current, |p| (p + current) / 2.0);
        quarters.insert(estimate.period_end - Duration::minutes(30), first);
        quarters.insert(estimate.period_end - Duration::minutes(15), current);
        previous = Some(current);
    }
    Ok(quarters)
}
