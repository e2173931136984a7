//! Snapshot acquisition: CSV loading, sources and the shared store.

pub mod loader;
mod source;
mod store;

pub use loader::{parse_price, parse_snapshot, parse_timestamp};
pub use source::{source_for_path, CsvDirectorySource, CsvFileSource, SnapshotSource};
pub use store::SnapshotStore;
