//! Price range filter.

use super::Filter;
use crate::observation::PriceObservation;

/// Filters observations by unit price range.
pub struct PriceFilter {
    min: Option<f64>,
    max: Option<f64>,
}

impl PriceFilter {
    /// Creates a new price filter with optional min/max bounds.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Creates a filter with only minimum price.
    pub fn min(price: f64) -> Self {
        Self { min: Some(price), max: None }
    }

    /// Creates a filter with only maximum price.
    pub fn max(price: f64) -> Self {
        Self { min: None, max: Some(price) }
    }

    /// Creates a filter with both min and max.
    pub fn range(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }
}

impl PriceFilter {
    /// Returns true if `price` lies within the inclusive bounds.
    pub fn contains(&self, price: f64) -> bool {
        if let Some(min) = self.min {
            if price < min {
                return false;
            }
        }

        if let Some(max) = self.max {
            if price > max {
                return false;
            }
        }

        true
    }
}

impl Filter for PriceFilter {
    fn matches(&self, observation: &PriceObservation) -> bool {
        // Invalid prices are left for the engine to drop
        if !observation.has_valid_price() {
            return true;
        }
        self.contains(observation.unit_price)
    }

    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Price: {:.2} - {:.2}", min, max),
            (Some(min), None) => format!("Price: >= {:.2}", min),
            (None, Some(max)) => format!("Price: <= {:.2}", max),
            (None, None) => "Price: any".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_observation(price: f64) -> PriceObservation {
        PriceObservation::new("Arroz", "Tio João", "5kg", price, "Guanabara", Utc::now())
    }

    #[test]
    fn test_min_price() {
        let filter = PriceFilter::min(20.0);
        assert!(!filter.matches(&make_observation(19.99)));
        assert!(filter.matches(&make_observation(20.0)));
        assert!(filter.matches(&make_observation(25.0)));
    }

    #[test]
    fn test_max_price() {
        let filter = PriceFilter::max(50.0);
        assert!(filter.matches(&make_observation(49.99)));
        assert!(filter.matches(&make_observation(50.0)));
        assert!(!filter.matches(&make_observation(50.01)));
    }

    #[test]
    fn test_price_range() {
        let filter = PriceFilter::range(10.0, 30.0);
        assert!(!filter.matches(&make_observation(9.99)));
        assert!(filter.matches(&make_observation(10.0)));
        assert!(filter.matches(&make_observation(30.0)));
        assert!(!filter.matches(&make_observation(30.01)));
    }

    #[test]
    fn test_contains_bounds() {
        let filter = PriceFilter::max(9.5);
        assert!(filter.contains(9.0));
        assert!(filter.contains(9.5));
        assert!(!filter.contains(10.0));
        assert!(PriceFilter::new(None, None).contains(1e9));
    }

    #[test]
    fn test_invalid_price_passes() {
        let filter = PriceFilter::range(10.0, 30.0);
        assert!(filter.matches(&make_observation(0.0)));
        assert!(filter.matches(&make_observation(f64::NAN)));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(PriceFilter::range(10.0, 30.0).description(), "Price: 10.00 - 30.00");
        assert_eq!(PriceFilter::min(5.0).description(), "Price: >= 5.00");
        assert_eq!(PriceFilter::max(7.5).description(), "Price: <= 7.50");
        assert_eq!(PriceFilter::new(None, None).description(), "Price: any");
    }
}
