//! Holder for the current snapshot, replaced wholesale on refresh.

use super::source::SnapshotSource;
use crate::error::Result;
use crate::observation::Snapshot;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Shares the current snapshot with readers.
///
/// Readers get an `Arc` to an immutable snapshot, so a refresh never changes
/// data under a running comparison.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    /// Creates a store holding `snapshot`.
    pub fn new(snapshot: Snapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)) }
    }

    /// Loads the initial snapshot from a source.
    pub async fn load(source: &dyn SnapshotSource) -> Result<Self> {
        Ok(Self::new(source.load().await?))
    }

    /// Returns the current snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replaces the snapshot and returns the previous one.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }

    /// Reloads from `source`. On failure the previous snapshot stays current.
    pub async fn refresh(&self, source: &dyn SnapshotSource) -> Result<Arc<Snapshot>> {
        match source.load().await {
            Ok(snapshot) => {
                info!("Refreshed snapshot from {} ({} observations)", source.describe(), snapshot.len());
                self.replace(snapshot);
                Ok(self.current())
            }
            Err(e) => {
                warn!("Refresh from {} failed: {}", source.describe(), e);
                Err(e)
            }
        }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Snapshot::empty())
    }
}
