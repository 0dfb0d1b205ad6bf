use chrono::{DateTime, Utc};

use super::PricePoint;
use crate::domain::slot_duration;

const KWH_PER_MWH: f64 = 1000.0;

/// Spot price per kWh for consecutive slots starting at `start`.
///
/// A slot takes the price of the point covering its start, so hourly prices repeat over four
/// slots. The sequence stops at the first slot no point covers.
pub fn slot_prices(points: &[PricePoint], start: DateTime<Utc>) -> Vec<f64> {
    let mut relevant: Vec<&PricePoint> = points.iter().filter(|p| p.time_end > start).collect();
    relevant.sort_by_key(|p| p.time_start);

    let mut prices = Vec::new();
    let mut slot_start = start;
    let mut idx = 0;
    loop {
        while relevant.get(idx).is_some_and(|p| p.time_end <= slot_start) {
            idx += 1;
        }
        match relevant.get(idx) {
            Some(p) if p.time_start <= slot_start => {
                prices.push(p.price_eur_per_mwh / KWH_PER_MWH);
                slot_start += slot_duration();
            }
            _ => break,
        }
    }
    prices
}
