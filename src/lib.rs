//! market-compare - Grocery price comparison across supermarkets
//!
//! Groups per-market price observations by product, finds the cheapest
//! market and flags outsized price gaps as opportunities.

pub mod cart;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod filters;
pub mod format;
pub mod observation;
pub mod snapshot;

pub use config::Config;
pub use engine::{
    compute_statistics, filter_observations, group_and_compare, ComparisonGroup, ComparisonOptions,
    Statistics,
};
pub use error::{Error, Result};
pub use observation::{GroupKey, PriceObservation, Snapshot};
