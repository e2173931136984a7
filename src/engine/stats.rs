//! Snapshot-wide dashboard statistics.

use super::models::Statistics;
use crate::observation::{GroupKey, Snapshot};
use std::collections::HashSet;

/// Reduces a whole snapshot to dashboard statistics.
///
/// Product counting uses the same normalized key as grouping. Price aggregates
/// only consider valid prices.
pub fn compute_statistics(snapshot: &Snapshot) -> Statistics {
    let observations = snapshot.observations();

    let mut keys: HashSet<GroupKey> = HashSet::new();
    let mut seen_markets: HashSet<&str> = HashSet::new();
    let mut markets = Vec::new();

    let mut sum = 0.0;
    let mut valid = 0usize;
    let mut min_price = f64::INFINITY;
    let mut max_price = f64::NEG_INFINITY;

    for observation in observations {
        keys.insert(observation.key());

        let market = observation.market_name();
        if seen_markets.insert(market) {
            markets.push(market.to_string());
        }

        if observation.has_valid_price() {
            sum += observation.unit_price;
            valid += 1;
            min_price = min_price.min(observation.unit_price);
            max_price = max_price.max(observation.unit_price);
        }
    }

    let (average_price, min_price, max_price) =
        if valid > 0 { (sum / valid as f64, min_price, max_price) } else { (0.0, 0.0, 0.0) };

    Statistics {
        total_products: keys.len(),
        total_markets: markets.len(),
        total_observations: observations.len(),
        markets,
        average_price,
        min_price,
        max_price,
        last_refreshed_at: observations.iter().map(|o| o.extracted_at).max(),
    }
}
