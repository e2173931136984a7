//! Cart command implementation.

use super::load_snapshot;
use crate::cart::{plan_cart, CartItem};
use crate::config::Config;
use crate::format::Formatter;
use crate::snapshot::{source_for_path, SnapshotSource};
use anyhow::Result;
use tracing::{info, warn};

/// Plans the cheapest purchase of a shopping list.
pub struct CartCommand {
    config: Config,
}

impl CartCommand {
    /// Creates a new cart command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads the configured snapshot and plans the cart.
    pub async fn execute(&self, items: &[CartItem]) -> Result<String> {
        let source = source_for_path(&self.config.snapshot);
        self.execute_with_source(source.as_ref(), items).await
    }

    /// Plans the cart with a provided source (for testing).
    pub async fn execute_with_source(
        &self,
        source: &dyn SnapshotSource,
        items: &[CartItem],
    ) -> Result<String> {
        let snapshot = load_snapshot(source).await?;
        let plan = plan_cart(&snapshot, items, &self.config.comparison_options()?);

        for item in &plan.unmatched {
            warn!("No price found for {}", item);
        }
        info!(
            "Planned {} products across {} markets",
            plan.line_count(),
            plan.totals_by_market.len()
        );

        Ok(Formatter::new(self.config.format, &self.config.currency).format_cart(&plan))
    }
}
