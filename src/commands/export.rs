//! Export command implementation.

use super::compare::{CompareCommand, CompareQuery};
use super::load_snapshot;
use crate::config::{Config, OutputFormat};
use crate::export::write_exports;
use crate::snapshot::{source_for_path, SnapshotSource};
use anyhow::{Context, Result};
use std::path::Path;

/// Writes the comparison table, the raw snapshot and per-market files as CSV.
pub struct ExportCommand {
    config: Config,
}

impl ExportCommand {
    /// Creates a new export command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Exports the configured snapshot into `out_dir`.
    pub async fn execute(&self, out_dir: &Path, query: &CompareQuery) -> Result<String> {
        let source = source_for_path(&self.config.snapshot);
        self.execute_with_source(source.as_ref(), out_dir, query).await
    }

    /// Exports with a provided source (for testing).
    pub async fn execute_with_source(
        &self,
        source: &dyn SnapshotSource,
        out_dir: &Path,
        query: &CompareQuery,
    ) -> Result<String> {
        let snapshot = load_snapshot(source).await?;
        let groups = CompareCommand::new(self.config.clone()).compare(&snapshot, query)?;

        let paths = write_exports(out_dir, &groups, &snapshot, &self.config.markets)
            .with_context(|| format!("Failed to export to {}", out_dir.display()))?;

        Ok(match self.config.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "comparisons": paths.comparisons,
                "observations": paths.observations,
                "markets": paths.markets,
                "groups": groups.len(),
                "rows": snapshot.len(),
            }))?,
            _ => format!(
                "Exported {} comparisons to {}\nExported {} observations to {}\nExported {} market files to {}",
                groups.len(),
                paths.comparisons.display(),
                snapshot.len(),
                paths.observations.display(),
                paths.markets.len(),
                out_dir.display()
            ),
        })
    }
}
