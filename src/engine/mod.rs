//! Price comparison engine.
//!
//! Turns a snapshot of per-market price observations into one ranked
//! comparison per product. Every function here is pure: the snapshot and
//! options are the only inputs, and nothing is cached between calls.

mod compare;
mod models;
mod options;
mod stats;

pub use compare::{group_and_compare, sort_by_savings};
pub use models::{ComparisonGroup, Offer, Statistics};
pub use options::{
    validate_threshold, ComparisonOptions, ReferenceBaseline, SortOrder,
    DEFAULT_OPPORTUNITY_THRESHOLD,
};
pub use stats::compute_statistics;

use crate::filters::{Filter, TermFilter};
use crate::observation::{PriceObservation, Snapshot};

/// Selects observations whose product name or brand contains `search_term`.
///
/// Matching is case-insensitive; an empty term matches everything.
pub fn filter_observations<'a>(snapshot: &'a Snapshot, search_term: &str) -> Vec<&'a PriceObservation> {
    filter_observations_with(snapshot, search_term, true)
}

/// Like [`filter_observations`], with brand matching switchable.
pub fn filter_observations_with<'a>(
    snapshot: &'a Snapshot,
    search_term: &str,
    match_brand: bool,
) -> Vec<&'a PriceObservation> {
    let filter = TermFilter::new(search_term, match_brand);
    snapshot.observations().iter().filter(|o| filter.matches(o)).collect()
}

/// Filters by term, then groups and compares.
pub fn compare_snapshot(
    snapshot: &Snapshot,
    search_term: &str,
    options: &ComparisonOptions,
) -> Vec<ComparisonGroup> {
    group_and_compare(filter_observations(snapshot, search_term), options)
}
