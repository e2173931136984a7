//! CSV export of comparison tables and raw snapshots for spreadsheet use.

use crate::config::MarketConfig;
use crate::engine::ComparisonGroup;
use crate::error::Result;
use crate::observation::{PriceObservation, Snapshot};
use chrono::{NaiveDate, Utc};
use csv::Writer;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name prefix of every export; snapshot discovery skips these files.
pub const EXPORT_PREFIX: &str = "comparison_";

const COMPARISON_HEADER: [&str; 11] = [
    "segment",
    "product",
    "brand",
    "quantity",
    "lowest_price",
    "market",
    "reference_price",
    "savings",
    "savings_percent",
    "opportunity",
    "link",
];

const OBSERVATION_HEADER: [&str; 8] = [
    "segment",
    "product_name",
    "brand",
    "quantity",
    "unit_price",
    "market",
    "extracted_at",
    "source_url",
];

/// Writes one row per comparison group.
///
/// The link is the cheapest offer's source URL, falling back to the
/// configured URL of its market.
pub fn write_comparisons<W: Write>(
    writer: W,
    groups: &[ComparisonGroup],
    markets: &[MarketConfig],
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(COMPARISON_HEADER)?;

    for group in groups {
        let link = group
            .cheapest()
            .and_then(|offer| offer.source_url.clone())
            .or_else(|| market_url(markets, &group.min_price_market))
            .unwrap_or_default();

        wtr.write_record([
            group.segment.clone().unwrap_or_else(|| "Other".to_string()),
            group.product_name.clone(),
            group.brand.clone(),
            group.quantity.clone(),
            format!("{:.2}", group.min_price),
            group.min_price_market.clone(),
            format!("{:.2}", group.reference_price),
            format!("{:.2}", group.savings_amount),
            format!("{:.2}", group.savings_percent),
            group.is_opportunity.to_string(),
            link,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the raw snapshot.
pub fn write_observations<W: Write>(writer: W, snapshot: &Snapshot) -> Result<()> {
    write_observation_rows(writer, snapshot.observations())
}

fn write_observation_rows<'a, W, I>(writer: W, observations: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a PriceObservation>,
{
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(OBSERVATION_HEADER)?;

    for o in observations {
        wtr.write_record([
            o.segment.clone().unwrap_or_default(),
            o.product_name.clone(),
            o.brand.clone(),
            o.quantity.clone(),
            o.unit_price.to_string(),
            o.market.clone(),
            o.extracted_at.to_rfc3339(),
            o.source_url.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Splits the snapshot into one observation list per market.
///
/// Markets keep their first-seen order. Names that reduce to the same file
/// slug share a list.
pub fn by_market(snapshot: &Snapshot) -> Vec<(String, Vec<&PriceObservation>)> {
    let mut breakdown: Vec<(String, Vec<&PriceObservation>)> = Vec::new();

    for o in snapshot.observations() {
        let slug = market_slug(o.market_name());
        match breakdown.iter_mut().find(|(s, _)| *s == slug) {
            Some((_, rows)) => rows.push(o),
            None => breakdown.push((slug, vec![o])),
        }
    }

    breakdown
}

/// File-safe form of a market name ("Rede Supermarket" becomes "rede_supermarket").
pub fn market_slug(name: &str) -> String {
    let mut slug = String::new();
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "market".to_string()
    } else {
        slug.to_string()
    }
}

fn market_url(markets: &[MarketConfig], name: &str) -> Option<String> {
    markets.iter().find(|m| m.name.eq_ignore_ascii_case(name.trim())).map(|m| m.url.clone())
}

/// Paths produced by [`write_exports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub comparisons: PathBuf,
    pub observations: PathBuf,
    /// One file per market, in first-seen market order
    pub markets: Vec<PathBuf>,
}

/// Returns the dated table and observation paths inside `dir`.
pub fn export_paths(dir: &Path, date: NaiveDate) -> ExportPaths {
    let stamp = date.format("%Y%m%d");
    ExportPaths {
        comparisons: dir.join(format!("{EXPORT_PREFIX}table_{stamp}.csv")),
        observations: dir.join(format!("{EXPORT_PREFIX}observations_{stamp}.csv")),
        markets: Vec::new(),
    }
}

/// Returns the dated path of one market's breakdown inside `dir`.
pub fn market_export_path(dir: &Path, date: NaiveDate, slug: &str) -> PathBuf {
    dir.join(format!("{EXPORT_PREFIX}market_{slug}_{}.csv", date.format("%Y%m%d")))
}

/// Writes the comparison table, the raw snapshot and a per-market breakdown into `dir`.
pub fn write_exports(
    dir: &Path,
    groups: &[ComparisonGroup],
    snapshot: &Snapshot,
    markets: &[MarketConfig],
) -> Result<ExportPaths> {
    std::fs::create_dir_all(dir)?;
    let date = Utc::now().date_naive();
    let mut paths = export_paths(dir, date);

    write_comparisons(std::fs::File::create(&paths.comparisons)?, groups, markets)?;
    write_observations(std::fs::File::create(&paths.observations)?, snapshot)?;

    for (slug, rows) in by_market(snapshot) {
        let path = market_export_path(dir, date, &slug);
        write_observation_rows(std::fs::File::create(&path)?, rows)?;
        paths.markets.push(path);
    }

    info!(
        "Exported {} comparisons to {}, {} observations to {} and {} market files",
        groups.len(),
        paths.comparisons.display(),
        snapshot.len(),
        paths.observations.display(),
        paths.markets.len()
    );

    Ok(paths)
}
