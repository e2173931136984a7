//! Observation filtering system with composable filters.

pub mod market;
pub mod price;
pub mod term;

use crate::observation::PriceObservation;

pub use market::MarketFilter;
pub use price::PriceFilter;
pub use term::{Attribute, AttributeFilter, TermFilter};

/// Trait for filtering price observations.
pub trait Filter: Send + Sync {
    /// Returns true if the observation passes the filter.
    fn matches(&self, observation: &PriceObservation) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// A chain of filters that must all pass.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Checks if an observation passes all filters.
    pub fn matches(&self, observation: &PriceObservation) -> bool {
        self.filters.iter().all(|f| f.matches(observation))
    }

    /// Filters a collection of observations, keeping input order.
    pub fn apply<'a, I>(&self, observations: I) -> Vec<&'a PriceObservation>
    where
        I: IntoIterator<Item = &'a PriceObservation>,
    {
        observations.into_iter().filter(|o| self.matches(o)).collect()
    }

    /// Returns true if no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns descriptions of all filters.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a FilterChain from query options.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    /// Adds a search term filter; blank terms add nothing.
    pub fn term(mut self, term: Option<&str>, match_brand: bool) -> Self {
        if let Some(term) = term {
            let filter = TermFilter::new(term, match_brand);
            if !filter.is_empty() {
                self.chain.add(filter);
            }
        }
        self
    }

    /// Adds a brand substring filter.
    pub fn brand(mut self, brand: Option<&str>) -> Self {
        if let Some(brand) = brand.filter(|b| !b.trim().is_empty()) {
            self.chain.add(AttributeFilter::brand(brand));
        }
        self
    }

    /// Adds a quantity substring filter.
    pub fn quantity(mut self, quantity: Option<&str>) -> Self {
        if let Some(quantity) = quantity.filter(|q| !q.trim().is_empty()) {
            self.chain.add(AttributeFilter::quantity(quantity));
        }
        self
    }

    /// Adds a price range filter.
    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_some() || max.is_some() {
            self.chain.add(PriceFilter::new(min, max));
        }
        self
    }

    /// Adds a market include/exclude filter.
    pub fn markets(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        if !include.is_empty() || !exclude.is_empty() {
            self.chain.add(MarketFilter::new(include, exclude));
        }
        self
    }

    /// Builds the filter chain.
    pub fn build(self) -> FilterChain {
        self.chain
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_observation(product: &str, brand: &str, price: f64, market: &str) -> PriceObservation {
        PriceObservation::new(product, brand, "1kg", price, market, Utc::now())
    }

    #[test]
    fn test_filter_chain_new() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn test_filter_chain_default() {
        let chain = FilterChain::default();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_filter_chain_empty_matches_all() {
        let chain = FilterChain::new();
        assert!(chain.matches(&make_observation("Arroz", "Camil", 0.0, "Mundial")));
    }

    #[test]
    fn test_filter_chain() {
        let mut chain = FilterChain::new();
        chain.add(TermFilter::new("arroz", false));
        chain.add(PriceFilter::new(Some(10.0), Some(30.0)));

        assert_eq!(chain.len(), 2);
        assert!(chain.matches(&make_observation("Arroz Branco", "Camil", 20.0, "Mundial")));
        assert!(!chain.matches(&make_observation("Arroz Branco", "Camil", 35.0, "Mundial")));
        assert!(!chain.matches(&make_observation("Feijão", "Camil", 20.0, "Mundial")));
    }

    #[test]
    fn test_filter_chain_apply_keeps_order() {
        let mut chain = FilterChain::new();
        chain.add(MarketFilter::excluding(vec!["Mundial".to_string()]));

        let observations = vec![
            make_observation("A", "", 1.0, "Prezunic"),
            make_observation("B", "", 1.0, "Mundial"),
            make_observation("C", "", 1.0, "Guanabara"),
        ];

        let filtered = chain.apply(&observations);
        let names: Vec<&str> = filtered.iter().map(|o| o.product_name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_filter_chain_descriptions() {
        let mut chain = FilterChain::new();
        chain.add(TermFilter::new("leite", true));
        chain.add(PriceFilter::range(1.0, 10.0));
        chain.add(MarketFilter::only(vec!["Guanabara".to_string()]));

        let descriptions = chain.descriptions();
        assert_eq!(descriptions.len(), 3);
        assert!(descriptions[0].contains("leite"));
        assert!(descriptions[1].contains("Price"));
        assert!(descriptions[2].contains("Markets"));
    }

    #[test]
    fn test_builder_all() {
        let chain = FilterChainBuilder::new()
            .term(Some("arroz"), true)
            .brand(Some("camil"))
            .quantity(Some("5kg"))
            .price_range(Some(10.0), None)
            .markets(vec!["Guanabara".to_string()], Vec::new())
            .build();

        assert_eq!(chain.len(), 5);
    }

    #[test]
    fn test_builder_no_filters_when_blank() {
        let chain = FilterChainBuilder::new()
            .term(Some("  "), true)
            .term(None, false)
            .brand(Some(""))
            .quantity(None)
            .price_range(None, None)
            .markets(Vec::new(), Vec::new())
            .build();

        assert!(chain.is_empty());
    }

    #[test]
    fn test_builder_default() {
        let chain = FilterChainBuilder::default().build();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_builder_combined() {
        let chain = FilterChainBuilder::new()
            .term(Some("arroz"), false)
            .brand(Some("tio"))
            .markets(Vec::new(), vec!["Mundial".to_string()])
            .build();

        assert!(chain.matches(&make_observation("Arroz", "Tio João", 20.0, "Guanabara")));
        assert!(!chain.matches(&make_observation("Arroz", "Camil", 20.0, "Guanabara")));
        assert!(!chain.matches(&make_observation("Arroz", "Tio João", 20.0, "Mundial")));
        assert!(!chain.matches(&make_observation("Feijão", "Tio João", 20.0, "Guanabara")));
    }
}
