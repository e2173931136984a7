//! Watch command: periodic snapshot reload with re-rendering.

use super::compare::{CompareCommand, CompareQuery};
use crate::config::Config;
use crate::engine::compute_statistics;
use crate::snapshot::{source_for_path, SnapshotSource, SnapshotStore};
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Re-runs a comparison whenever the acquisition process publishes new data.
pub struct WatchCommand {
    config: Config,
    interval: Duration,
}

impl WatchCommand {
    /// Creates a watch command polling every `watch_interval_secs`.
    pub fn new(config: Config) -> Self {
        let interval = Duration::from_secs(config.watch_interval_secs);
        Self { config, interval }
    }

    /// Overrides the polling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Watches the configured snapshot until Ctrl-C, passing each rendering to `emit`.
    pub async fn execute<F>(&self, query: &CompareQuery, emit: F) -> Result<usize>
    where
        F: FnMut(String),
    {
        let source = source_for_path(&self.config.snapshot);
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.execute_with_source(source.as_ref(), query, shutdown, emit).await
    }

    /// Watches `source` until `shutdown` resolves. Returns the number of renderings.
    pub async fn execute_with_source<S, F>(
        &self,
        source: &dyn SnapshotSource,
        query: &CompareQuery,
        shutdown: S,
        mut emit: F,
    ) -> Result<usize>
    where
        S: Future<Output = ()>,
        F: FnMut(String),
    {
        let compare = CompareCommand::new(self.config.clone());
        let store = SnapshotStore::load(source)
            .await
            .with_context(|| format!("Failed to load snapshot from {}", source.describe()))?;

        let snapshot = store.current();
        let mut last_refreshed = compute_statistics(&snapshot).last_refreshed_at;
        emit(compare.render(&snapshot, query)?);
        let mut renders = 1;

        info!("Watching {} every {:?}", source.describe(), self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping watch after {} renderings", renders);
                    break;
                }
                _ = ticker.tick() => {
                    // A failed refresh is logged by the store; keep the old data
                    let Ok(snapshot) = store.refresh(source).await else {
                        continue;
                    };

                    let refreshed = compute_statistics(&snapshot).last_refreshed_at;
                    if refreshed == last_refreshed {
                        debug!("Snapshot unchanged since {:?}", last_refreshed);
                        continue;
                    }

                    last_refreshed = refreshed;
                    emit(compare.render(&snapshot, query)?);
                    renders += 1;
                }
            }
        }

        Ok(renders)
    }
}
