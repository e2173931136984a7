//! Compare command implementation.

use super::load_snapshot;
use crate::config::Config;
use crate::engine::{group_and_compare, sort_by_savings, ComparisonGroup, SortOrder};
use crate::filters::{Filter, FilterChain, FilterChainBuilder, PriceFilter};
use crate::format::Formatter;
use crate::observation::Snapshot;
use crate::snapshot::{source_for_path, SnapshotSource};
use anyhow::Result;
use tracing::{debug, info};

/// What to compare. Unset fields do not filter.
///
/// Term, attribute and market filters select observations before grouping, so
/// excluded markets take no part in the savings. The price range selects
/// groups by their cheapest offer after grouping.
#[derive(Debug, Clone, Default)]
pub struct CompareQuery {
    pub term: Option<String>,
    pub brand: Option<String>,
    pub quantity: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub markets: Vec<String>,
    pub exclude_markets: Vec<String>,
}

impl CompareQuery {
    /// Creates a query for a search term.
    pub fn term(term: impl Into<String>) -> Self {
        Self { term: Some(term.into()), ..Self::default() }
    }

    fn filters(&self, match_brand: bool) -> FilterChain {
        FilterChainBuilder::new()
            .term(self.term.as_deref(), match_brand)
            .brand(self.brand.as_deref())
            .quantity(self.quantity.as_deref())
            .markets(self.markets.clone(), self.exclude_markets.clone())
            .build()
    }

    fn price_range(&self) -> Option<PriceFilter> {
        if self.min_price.is_none() && self.max_price.is_none() {
            return None;
        }
        Some(PriceFilter::new(self.min_price, self.max_price))
    }
}

/// Executes a price comparison.
pub struct CompareCommand {
    config: Config,
}

impl CompareCommand {
    /// Creates a new compare command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads the configured snapshot and returns formatted comparisons.
    pub async fn execute(&self, query: &CompareQuery) -> Result<String> {
        let source = source_for_path(&self.config.snapshot);
        self.execute_with_source(source.as_ref(), query).await
    }

    /// Executes the comparison with a provided source (for testing).
    pub async fn execute_with_source(
        &self,
        source: &dyn SnapshotSource,
        query: &CompareQuery,
    ) -> Result<String> {
        let snapshot = load_snapshot(source).await?;
        self.render(&snapshot, query)
    }

    /// Compares and formats a snapshot already in memory.
    pub fn render(&self, snapshot: &Snapshot, query: &CompareQuery) -> Result<String> {
        let groups = self.compare(snapshot, query)?;
        Ok(Formatter::new(self.config.format, &self.config.currency).format_groups(&groups))
    }

    /// Filters, groups and orders the snapshot according to the config.
    pub fn compare(&self, snapshot: &Snapshot, query: &CompareQuery) -> Result<Vec<ComparisonGroup>> {
        let options = self.config.comparison_options()?;

        let filters = query.filters(self.config.match_brand);
        if !filters.is_empty() {
            debug!("Active filters: {}", filters.descriptions().join(", "));
        }

        let matched = filters.apply(snapshot.observations());
        let mut groups = group_and_compare(matched.iter().copied(), &options);

        if let Some(range) = query.price_range() {
            debug!("Group filter: {}", range.description());
            groups.retain(|g| range.contains(g.min_price));
        }

        if self.config.sort == SortOrder::Savings {
            sort_by_savings(&mut groups);
        }

        info!(
            "Compared {} products from {} observations ({} opportunities)",
            groups.len(),
            matched.len(),
            groups.iter().filter(|g| g.is_opportunity).count()
        );

        Ok(groups)
    }
}
