//! Market include/exclude filter.

use super::Filter;
use crate::observation::PriceObservation;

/// Restricts observations to (or away from) a set of markets.
///
/// Market names are compared trimmed and case-insensitively.
pub struct MarketFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl MarketFilter {
    /// Creates a new market filter. An empty include list allows all markets.
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include: normalize(include), exclude: normalize(exclude) }
    }

    /// Creates a filter that only keeps the given markets.
    pub fn only(markets: Vec<String>) -> Self {
        Self::new(markets, Vec::new())
    }

    /// Creates a filter that drops the given markets.
    pub fn excluding(markets: Vec<String>) -> Self {
        Self::new(Vec::new(), markets)
    }
}

fn normalize(markets: Vec<String>) -> Vec<String> {
    markets
        .into_iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .collect()
}

impl Filter for MarketFilter {
    fn matches(&self, observation: &PriceObservation) -> bool {
        let market = observation.market_name().to_lowercase();

        if !self.include.is_empty() && !self.include.contains(&market) {
            return false;
        }

        !self.exclude.contains(&market)
    }

    fn description(&self) -> String {
        let mut parts = Vec::new();

        if !self.include.is_empty() {
            parts.push(format!("Markets: {}", self.include.join(", ")));
        }

        if !self.exclude.is_empty() {
            parts.push(format!("Excluding markets: {}", self.exclude.join(", ")));
        }

        if parts.is_empty() {
            "Markets: any".to_string()
        } else {
            parts.join("; ")
        }
    }
}
