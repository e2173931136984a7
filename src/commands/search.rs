//! Search command implementation.

use super::load_snapshot;
use crate::config::Config;
use crate::engine::filter_observations_with;
use crate::format::Formatter;
use crate::snapshot::{source_for_path, SnapshotSource};
use anyhow::Result;
use tracing::info;

/// Lists the raw observations matching a term.
pub struct SearchCommand {
    config: Config,
}

impl SearchCommand {
    /// Creates a new search command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the search and returns formatted output.
    pub async fn execute(&self, term: &str) -> Result<String> {
        let source = source_for_path(&self.config.snapshot);
        self.execute_with_source(source.as_ref(), term).await
    }

    /// Executes the search with a provided source (for testing).
    pub async fn execute_with_source(&self, source: &dyn SnapshotSource, term: &str) -> Result<String> {
        let snapshot = load_snapshot(source).await?;

        let matched = filter_observations_with(&snapshot, term, self.config.match_brand);
        info!("Found {} observations for '{}'", matched.len(), term);

        Ok(Formatter::new(self.config.format, &self.config.currency).format_observations(&matched))
    }
}
