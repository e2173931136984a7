//! Data models for price observations and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single price data point for a product at one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Product name as collected (display casing)
    pub product_name: String,
    /// Brand, may be empty
    pub brand: String,
    /// Package size label ("1kg", "500ml"), never parsed
    pub quantity: String,
    /// Unit price; only finite positive values are usable
    pub unit_price: f64,
    /// Retailer/store name
    pub market: String,
    /// When the price was collected
    pub extracted_at: DateTime<Utc>,
    /// Product category, if the acquisition process tagged one
    #[serde(default)]
    pub segment: Option<String>,
    /// Page or flyer the price was collected from
    #[serde(default)]
    pub source_url: Option<String>,
}

impl PriceObservation {
    /// Creates an observation without segment or source URL.
    pub fn new(
        product_name: impl Into<String>,
        brand: impl Into<String>,
        quantity: impl Into<String>,
        unit_price: f64,
        market: impl Into<String>,
        extracted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            brand: brand.into(),
            quantity: quantity.into(),
            unit_price,
            market: market.into(),
            extracted_at,
            segment: None,
            source_url: None,
        }
    }

    /// Returns true if the price can take part in a comparison.
    pub fn has_valid_price(&self) -> bool {
        self.unit_price.is_finite() && self.unit_price > 0.0
    }

    /// Returns the normalized grouping key.
    pub fn key(&self) -> GroupKey {
        GroupKey::new(&self.product_name, &self.brand, &self.quantity)
    }

    /// Returns the market name with surrounding whitespace removed.
    pub fn market_name(&self) -> &str {
        self.market.trim()
    }
}

/// Normalized (product, brand, quantity) identity of a comparable product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub product: String,
    pub brand: String,
    pub quantity: String,
}

impl GroupKey {
    /// Product and brand are trimmed and lower-cased; quantity is only trimmed.
    pub fn new(product: &str, brand: &str, quantity: &str) -> Self {
        Self {
            product: product.trim().to_lowercase(),
            brand: brand.trim().to_lowercase(),
            quantity: quantity.trim().to_string(),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}|{}", self.product, self.brand, self.quantity)
    }
}

/// Immutable set of observations known at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Where the observations were loaded from
    pub source: String,
    /// When the snapshot was loaded
    pub loaded_at: DateTime<Utc>,
    observations: Vec<PriceObservation>,
}

impl Snapshot {
    /// Creates a snapshot from observations in acquisition order.
    pub fn new(source: impl Into<String>, observations: Vec<PriceObservation>) -> Self {
        Self { source: source.into(), loaded_at: Utc::now(), observations }
    }

    /// Creates an empty snapshot.
    pub fn empty() -> Self {
        Self::new("empty", Vec::new())
    }

    /// Returns the observations in load order.
    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    /// Returns number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns true if the snapshot has no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
