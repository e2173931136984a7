//! Tunable parameters of the comparison.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default savings percentage at which a group is flagged as an opportunity.
pub const DEFAULT_OPPORTUNITY_THRESHOLD: f64 = 30.0;

/// Price a shopper is assumed to pay without comparing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceBaseline {
    /// Most expensive offer among compared markets
    #[default]
    Maximum,
    /// Mean of all offers
    Average,
    /// Second cheapest offer
    RunnerUp,
}

impl std::str::FromStr for ReferenceBaseline {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "maximum" | "max" => Ok(ReferenceBaseline::Maximum),
            "average" | "avg" | "mean" => Ok(ReferenceBaseline::Average),
            "runner-up" | "runnerup" | "second" => Ok(ReferenceBaseline::RunnerUp),
            _ => Err(format!("Unknown reference: {}. Use: maximum, average, runner-up", s)),
        }
    }
}

impl std::fmt::Display for ReferenceBaseline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceBaseline::Maximum => write!(f, "maximum"),
            ReferenceBaseline::Average => write!(f, "average"),
            ReferenceBaseline::RunnerUp => write!(f, "runner-up"),
        }
    }
}

/// Order in which comparison groups are returned to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// First appearance of the product in the filtered input
    #[default]
    FirstSeen,
    /// Largest savings first
    Savings,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-seen" | "firstseen" | "input" => Ok(SortOrder::FirstSeen),
            "savings" => Ok(SortOrder::Savings),
            _ => Err(format!("Unknown sort order: {}. Use: first-seen, savings", s)),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::FirstSeen => write!(f, "first-seen"),
            SortOrder::Savings => write!(f, "savings"),
        }
    }
}

/// Parameters for `group_and_compare`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonOptions {
    /// Savings percentage at or above which a group is an opportunity
    pub opportunity_threshold: f64,
    /// Baseline for savings
    pub reference: ReferenceBaseline,
}

impl ComparisonOptions {
    /// Creates options with a validated threshold and the default baseline.
    pub fn new(opportunity_threshold: f64) -> Result<Self> {
        validate_threshold(opportunity_threshold)?;
        Ok(Self { opportunity_threshold, reference: ReferenceBaseline::default() })
    }

    /// Replaces the reference baseline.
    pub fn with_reference(mut self, reference: ReferenceBaseline) -> Self {
        self.reference = reference;
        self
    }
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            opportunity_threshold: DEFAULT_OPPORTUNITY_THRESHOLD,
            reference: ReferenceBaseline::default(),
        }
    }
}

/// Checks that a threshold is a percentage in 0..=100.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
        return Err(Error::InvalidConfig(format!(
            "opportunity threshold must be between 0 and 100, got {}",
            threshold
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ComparisonOptions::default();
        assert_eq!(options.opportunity_threshold, 30.0);
        assert_eq!(options.reference, ReferenceBaseline::Maximum);
    }

    #[test]
    fn test_options_new_validates() {
        assert!(ComparisonOptions::new(0.0).is_ok());
        assert!(ComparisonOptions::new(100.0).is_ok());
        assert!(ComparisonOptions::new(-1.0).is_err());
        assert!(ComparisonOptions::new(100.5).is_err());

        let err = ComparisonOptions::new(f64::NAN).unwrap_err();
        assert!(err.to_string().contains("opportunity threshold"));
    }

    #[test]
    fn test_with_reference() {
        let options = ComparisonOptions::new(25.0).unwrap().with_reference(ReferenceBaseline::RunnerUp);
        assert_eq!(options.opportunity_threshold, 25.0);
        assert_eq!(options.reference, ReferenceBaseline::RunnerUp);
    }

    #[test]
    fn test_reference_parsing() {
        assert_eq!("maximum".parse::<ReferenceBaseline>().unwrap(), ReferenceBaseline::Maximum);
        assert_eq!("MAX".parse::<ReferenceBaseline>().unwrap(), ReferenceBaseline::Maximum);
        assert_eq!("average".parse::<ReferenceBaseline>().unwrap(), ReferenceBaseline::Average);
        assert_eq!("runner-up".parse::<ReferenceBaseline>().unwrap(), ReferenceBaseline::RunnerUp);

        let err = "median".parse::<ReferenceBaseline>().unwrap_err();
        assert!(err.contains("Unknown reference"));
    }

    #[test]
    fn test_reference_display_and_serde() {
        assert_eq!(ReferenceBaseline::RunnerUp.to_string(), "runner-up");
        let json = serde_json::to_string(&ReferenceBaseline::RunnerUp).unwrap();
        assert_eq!(json, "\"runner-up\"");

        let parsed: ReferenceBaseline = serde_json::from_str("\"average\"").unwrap();
        assert_eq!(parsed, ReferenceBaseline::Average);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("first-seen".parse::<SortOrder>().unwrap(), SortOrder::FirstSeen);
        assert_eq!("Savings".parse::<SortOrder>().unwrap(), SortOrder::Savings);
        assert!("price".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::FirstSeen);
        assert_eq!(SortOrder::Savings.to_string(), "savings");
    }
}
