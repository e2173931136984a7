//! Derived comparison results.

use crate::observation::GroupKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price offered by one market for a comparison group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub market: String,
    pub price: f64,
    /// Collection time of the retained observation
    pub extracted_at: DateTime<Utc>,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Ranked summary of one product across markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonGroup {
    /// Normalized grouping key
    pub key: GroupKey,
    /// Display name from the first observation seen
    pub product_name: String,
    pub brand: String,
    pub quantity: String,
    pub segment: Option<String>,
    /// One offer per market, cheapest first
    pub offers: Vec<Offer>,
    pub min_price: f64,
    pub min_price_market: String,
    /// Baseline the savings are measured against
    pub reference_price: f64,
    pub savings_amount: f64,
    pub savings_percent: f64,
    /// Mean of all offer prices
    pub average_price: f64,
    /// How far the cheapest offer sits below the average
    pub average_delta: f64,
    pub average_delta_percent: f64,
    pub is_opportunity: bool,
}

impl ComparisonGroup {
    /// Returns the cheapest offer, or `None` for a group built without offers.
    pub fn cheapest(&self) -> Option<&Offer> {
        self.offers.first()
    }

    /// Returns the most expensive offer.
    pub fn most_expensive(&self) -> Option<&Offer> {
        self.offers.last()
    }

    /// Returns the compared markets, cheapest first.
    pub fn markets(&self) -> Vec<&str> {
        self.offers.iter().map(|o| o.market.as_str()).collect()
    }

    /// Returns the number of markets carrying the product.
    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    /// Returns the price at a market, if it carries the product.
    pub fn price_at(&self, market: &str) -> Option<f64> {
        self.offers.iter().find(|o| o.market.eq_ignore_ascii_case(market.trim())).map(|o| o.price)
    }

    /// Returns a one-line label ("Arroz Tio João 5kg").
    pub fn label(&self) -> String {
        [self.product_name.as_str(), self.brand.as_str(), self.quantity.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Dashboard summary over a whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Distinct normalized (product, brand, quantity) keys
    pub total_products: usize,
    /// Distinct market names
    pub total_markets: usize,
    /// Every observation, valid or not
    pub total_observations: usize,
    /// Markets in first-seen order
    pub markets: Vec<String>,
    /// Mean over valid prices, 0 when there are none
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Latest collection time in the snapshot
    pub last_refreshed_at: Option<DateTime<Utc>>,
}
