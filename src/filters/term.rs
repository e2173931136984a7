//! Free-text search term and attribute filters.

use super::Filter;
use crate::observation::PriceObservation;

/// Matches a search term against the product name (and optionally the brand).
pub struct TermFilter {
    /// Lower-cased, trimmed term; empty matches everything.
    term: String,
    match_brand: bool,
}

impl TermFilter {
    /// Creates a new term filter.
    pub fn new(term: &str, match_brand: bool) -> Self {
        Self { term: term.trim().to_lowercase(), match_brand }
    }

    /// Returns true if the term is empty.
    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }
}

impl Filter for TermFilter {
    fn matches(&self, observation: &PriceObservation) -> bool {
        if self.term.is_empty() {
            return true;
        }

        if observation.product_name.to_lowercase().contains(&self.term) {
            return true;
        }

        self.match_brand && observation.brand.to_lowercase().contains(&self.term)
    }

    fn description(&self) -> String {
        if self.term.is_empty() {
            "Term: any".to_string()
        } else if self.match_brand {
            format!("Product or brand contains: {}", self.term)
        } else {
            format!("Product contains: {}", self.term)
        }
    }
}

/// Observation attribute an [`AttributeFilter`] inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Brand,
    Quantity,
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attribute::Brand => write!(f, "Brand"),
            Attribute::Quantity => write!(f, "Quantity"),
        }
    }
}

/// Case-insensitive substring match on a single attribute.
pub struct AttributeFilter {
    attribute: Attribute,
    needle: String,
}

impl AttributeFilter {
    pub fn new(attribute: Attribute, needle: &str) -> Self {
        Self { attribute, needle: needle.trim().to_lowercase() }
    }

    pub fn brand(needle: &str) -> Self {
        Self::new(Attribute::Brand, needle)
    }

    pub fn quantity(needle: &str) -> Self {
        Self::new(Attribute::Quantity, needle)
    }
}

impl Filter for AttributeFilter {
    fn matches(&self, observation: &PriceObservation) -> bool {
        let value = match self.attribute {
            Attribute::Brand => &observation.brand,
            Attribute::Quantity => &observation.quantity,
        };
        value.to_lowercase().contains(&self.needle)
    }

    fn description(&self) -> String {
        format!("{} contains: {}", self.attribute, self.needle)
    }
}
