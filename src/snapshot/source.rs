//! Snapshot sources: where the acquisition process leaves its CSV files.

use super::loader::parse_snapshot;
use crate::error::{Error, Result};
use crate::export::EXPORT_PREFIX;
use crate::observation::Snapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Trait for snapshot acquisition - enables mocking for tests.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Loads a complete snapshot.
    async fn load(&self) -> Result<Snapshot>;

    /// Describes the source for logs.
    fn describe(&self) -> String;
}

/// Reads a single CSV file.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

async fn read_csv(path: &Path) -> Result<Snapshot> {
    debug!("Reading snapshot file: {}", path.display());
    let bytes = tokio::fs::read(path).await?;
    parse_snapshot(bytes.as_slice(), &path.display().to_string())
}

#[async_trait]
impl SnapshotSource for CsvFileSource {
    async fn load(&self) -> Result<Snapshot> {
        read_csv(&self.path).await
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads the most recently modified CSV in a directory.
///
/// Files written by the export command are ignored.
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Finds the newest snapshot file.
    pub async fn latest_file(&self) -> Result<PathBuf> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut latest: Option<(SystemTime, PathBuf)> = None;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_snapshot_file(&path) {
                continue;
            }

            let modified = entry.metadata().await?.modified()?;
            let newer = match &latest {
                Some((current, current_path)) => {
                    modified > *current || (modified == *current && path > *current_path)
                }
                None => true,
            };
            if newer {
                latest = Some((modified, path));
            }
        }

        latest.map(|(_, path)| path).ok_or_else(|| Error::NoSnapshot(self.dir.clone()))
    }
}

fn is_snapshot_file(path: &Path) -> bool {
    let is_csv = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let is_export = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(EXPORT_PREFIX));
    is_csv && !is_export
}

#[async_trait]
impl SnapshotSource for CsvDirectorySource {
    async fn load(&self) -> Result<Snapshot> {
        let path = self.latest_file().await?;
        info!("Using snapshot {}", path.display());
        read_csv(&path).await
    }

    fn describe(&self) -> String {
        format!("latest CSV in {}", self.dir.display())
    }
}

/// Picks a directory or single-file source for a path.
pub fn source_for_path(path: &Path) -> Box<dyn SnapshotSource> {
    if path.is_dir() {
        Box::new(CsvDirectorySource::new(path))
    } else {
        Box::new(CsvFileSource::new(path))
    }
}
