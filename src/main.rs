//! market-compare - Grocery price comparison across supermarkets
//!
//! Reads price snapshots collected from market flyers and reports where each
//! product is cheapest.

use anyhow::Result;
use clap::{Parser, Subcommand};
use market_compare::cart::CartItem;
use market_compare::commands::{
    list_markets, CartCommand, CompareCommand, CompareQuery, ExportCommand, SearchCommand,
    StatsCommand, WatchCommand,
};
use market_compare::config::{Config, OutputFormat};
use market_compare::engine::{ReferenceBaseline, SortOrder};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "market-compare",
    version,
    about = "Compare grocery prices across supermarkets",
    long_about = "Groups price observations by product, shows the cheapest market and flags price gaps worth acting on."
)]
struct Cli {
    /// Snapshot CSV file, or a directory whose newest CSV is used
    #[arg(short, long, global = true, env = "MKT_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Savings percentage flagged as an opportunity (0-100)
    #[arg(short, long, global = true)]
    threshold: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Filters shared by the comparing subcommands.
#[derive(clap::Args)]
struct QueryArgs {
    /// Product or brand search term
    query: Option<String>,

    /// Brand must contain this text
    #[arg(long)]
    brand: Option<String>,

    /// Quantity label must contain this text
    #[arg(long)]
    quantity: Option<String>,

    /// Keep products whose cheapest price is at least this
    #[arg(long)]
    min_price: Option<f64>,

    /// Keep products whose cheapest price is at most this
    #[arg(long)]
    max_price: Option<f64>,

    /// Compare only these markets (comma-separated); savings ignore the others
    #[arg(long = "market", value_delimiter = ',')]
    markets: Vec<String>,

    /// Leave these markets out of the comparison (comma-separated)
    #[arg(long = "exclude-market", value_delimiter = ',')]
    exclude_markets: Vec<String>,

    /// Result order
    #[arg(long)]
    sort: Option<SortOrder>,

    /// Baseline for savings
    #[arg(long)]
    reference: Option<ReferenceBaseline>,

    /// Match the search term against product names only
    #[arg(long)]
    no_brand_match: bool,
}

impl QueryArgs {
    /// Applies the ordering options to the config and returns the filters.
    fn apply(self, config: &mut Config) -> CompareQuery {
        if let Some(sort) = self.sort {
            config.sort = sort;
        }
        if let Some(reference) = self.reference {
            config.reference = reference;
        }
        if self.no_brand_match {
            config.match_brand = false;
        }

        CompareQuery {
            term: self.query,
            brand: self.brand,
            quantity: self.quantity,
            min_price: self.min_price,
            max_price: self.max_price,
            markets: self.markets,
            exclude_markets: self.exclude_markets,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare prices of matching products across markets
    #[command(alias = "c")]
    Compare {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// List the raw observations matching a term
    #[command(alias = "s")]
    Search {
        /// Product or brand search term
        term: String,

        /// Match the term against product names only
        #[arg(long)]
        no_brand_match: bool,
    },

    /// Show snapshot statistics
    Stats,

    /// Plan the cheapest purchase of a shopping list
    Cart {
        /// Items as product[/brand[/quantity]]
        #[arg(required = true)]
        items: Vec<CartItem>,
    },

    /// Export the comparison table and raw snapshot as CSV
    Export {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// List configured markets
    Markets,

    /// Reload the snapshot periodically and re-render on new data
    Watch {
        #[command(flatten)]
        query: QueryArgs,

        /// Seconds between reloads
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(snapshot) = cli.snapshot {
        config.snapshot = snapshot;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(threshold) = cli.threshold {
        config.opportunity_threshold = threshold;
    }

    match cli.command {
        Commands::Compare { query } => {
            let query = query.apply(&mut config);
            config.validate()?;

            let output = CompareCommand::new(config).execute(&query).await?;
            println!("{}", output);
        }

        Commands::Search { term, no_brand_match } => {
            if no_brand_match {
                config.match_brand = false;
            }

            let output = SearchCommand::new(config).execute(&term).await?;
            println!("{}", output);
        }

        Commands::Stats => {
            let output = StatsCommand::new(config).execute().await?;
            println!("{}", output);
        }

        Commands::Cart { items } => {
            config.validate()?;

            let output = CartCommand::new(config).execute(&items).await?;
            println!("{}", output);
        }

        Commands::Export { out, query } => {
            let query = query.apply(&mut config);
            config.validate()?;

            let output = ExportCommand::new(config).execute(&out, &query).await?;
            println!("{}", output);
        }

        Commands::Markets => {
            println!("{}", list_markets(&config)?);
        }

        Commands::Watch { query, interval } => {
            let query = query.apply(&mut config);
            if let Some(secs) = interval {
                config.watch_interval_secs = secs;
            }
            config.validate()?;

            WatchCommand::new(config)
                .execute(&query, |output| {
                    println!("{}", output);
                    println!();
                })
                .await?;
        }
    }

    Ok(())
}
