//! CLI command implementations.

pub mod cart;
pub mod compare;
pub mod export;
pub mod markets;
pub mod search;
pub mod stats;
pub mod watch;

pub use cart::CartCommand;
pub use compare::{CompareCommand, CompareQuery};
pub use export::ExportCommand;
pub use markets::list_markets;
pub use search::SearchCommand;
pub use stats::StatsCommand;
pub use watch::WatchCommand;

use crate::observation::Snapshot;
use crate::snapshot::SnapshotSource;
use anyhow::{Context, Result};
use tracing::debug;

/// Loads a snapshot, naming the source on failure.
async fn load_snapshot(source: &dyn SnapshotSource) -> Result<Snapshot> {
    let snapshot = source
        .load()
        .await
        .with_context(|| format!("Failed to load snapshot from {}", source.describe()))?;

    debug!("Loaded {} observations from {}", snapshot.len(), snapshot.source);
    Ok(snapshot)
}
