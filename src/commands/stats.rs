//! Stats command implementation.

use super::load_snapshot;
use crate::config::Config;
use crate::engine::compute_statistics;
use crate::format::Formatter;
use crate::snapshot::{source_for_path, SnapshotSource};
use anyhow::Result;

/// Prints dashboard statistics for the whole snapshot.
pub struct StatsCommand {
    config: Config,
}

impl StatsCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<String> {
        let source = source_for_path(&self.config.snapshot);
        self.execute_with_source(source.as_ref()).await
    }

    pub async fn execute_with_source(&self, source: &dyn SnapshotSource) -> Result<String> {
        let snapshot = load_snapshot(source).await?;
        let stats = compute_statistics(&snapshot);
        Ok(Formatter::new(self.config.format, &self.config.currency).format_statistics(&stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{groceries, MockSource};
    use crate::config::OutputFormat;

    #[tokio::test]
    async fn test_stats_json() {
        let cmd = StatsCommand::new(Config { format: OutputFormat::Json, ..Config::default() });
        let output = cmd.execute_with_source(&MockSource::with(groceries())).await.unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["total_products"], 3);
        assert_eq!(parsed["total_markets"], 4);
        assert_eq!(parsed["total_observations"], 6);
        assert_eq!(parsed["min_price"], 5.0);
        assert_eq!(parsed["max_price"], 30.0);
    }

    #[tokio::test]
    async fn test_stats_empty_snapshot() {
        let cmd = StatsCommand::new(Config::default());
        let output = cmd.execute_with_source(&MockSource::with(Vec::new())).await.unwrap();
        assert!(output.contains("Products:      0"));
        assert!(output.contains("Average price: R$ 0.00"));
    }
}
