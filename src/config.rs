//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::engine::{
    validate_threshold, ComparisonOptions, ReferenceBaseline, SortOrder,
    DEFAULT_OPPORTUNITY_THRESHOLD,
};
use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A market the acquisition process collects from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub name: String,
    /// Offers page, used as the link when an observation carries none
    pub url: String,
}

impl MarketConfig {
    fn new(name: &str, url: &str) -> Self {
        Self { name: name.to_string(), url: url.to_string() }
    }
}

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot CSV file, or directory whose newest CSV is used
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Currency symbol for rendered prices
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Savings percentage flagged as an opportunity
    #[serde(default = "default_threshold")]
    pub opportunity_threshold: f64,

    /// Baseline for savings
    #[serde(default)]
    pub reference: ReferenceBaseline,

    /// Whether the search term also matches brands
    #[serde(default = "default_match_brand")]
    pub match_brand: bool,

    /// Result order
    #[serde(default)]
    pub sort: SortOrder,

    /// Seconds between snapshot reloads in watch mode
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,

    /// Known markets
    #[serde(default = "default_markets")]
    pub markets: Vec<MarketConfig>,
}

fn default_snapshot() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("market-compare").join("csv"))
        .unwrap_or_else(|| PathBuf::from("data/csv"))
}

fn default_currency() -> String {
    "R$".to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_OPPORTUNITY_THRESHOLD
}

fn default_match_brand() -> bool {
    true
}

fn default_watch_interval_secs() -> u64 {
    3600
}

fn default_markets() -> Vec<MarketConfig> {
    vec![
        MarketConfig::new("Guanabara", "https://www.supermercadosguanabara.com.br/encarte"),
        MarketConfig::new("Mundial", "https://www.supermercadosmundial.com.br/ofertas"),
        MarketConfig::new("Supermarket", "https://redesupermarket.com.br/ofertas/"),
        MarketConfig::new("Prezunic", "https://www.prezunic.com.br/ofertas"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot(),
            format: OutputFormat::Table,
            currency: default_currency(),
            opportunity_threshold: default_threshold(),
            reference: ReferenceBaseline::Maximum,
            match_brand: default_match_brand(),
            sort: SortOrder::FirstSeen,
            watch_interval_secs: default_watch_interval_secs(),
            markets: default_markets(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("market-compare.toml");
        if local_config.exists() {
            debug!("Found market-compare.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("market-compare").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(snapshot) = std::env::var("MKT_SNAPSHOT") {
            if !snapshot.trim().is_empty() {
                self.snapshot = PathBuf::from(snapshot);
            }
        }

        if let Ok(threshold) = std::env::var("MKT_THRESHOLD") {
            if let Ok(t) = threshold.parse() {
                self.opportunity_threshold = t;
            }
        }

        if let Ok(format) = std::env::var("MKT_FORMAT") {
            if let Ok(f) = format.parse() {
                self.format = f;
            }
        }

        self
    }

    /// Rejects values the engine or watch loop cannot work with.
    pub fn validate(&self) -> Result<(), Error> {
        validate_threshold(self.opportunity_threshold)?;

        if self.watch_interval_secs == 0 {
            return Err(Error::InvalidConfig("watch interval must be at least 1 second".into()));
        }

        Ok(())
    }

    /// Builds the engine options from this configuration.
    pub fn comparison_options(&self) -> Result<ComparisonOptions, Error> {
        Ok(ComparisonOptions::new(self.opportunity_threshold)?.with_reference(self.reference))
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.currency, "R$");
        assert_eq!(config.opportunity_threshold, 30.0);
        assert_eq!(config.reference, ReferenceBaseline::Maximum);
        assert!(config.match_brand);
        assert_eq!(config.sort, SortOrder::FirstSeen);
        assert_eq!(config.watch_interval_secs, 3600);
        assert_eq!(config.markets.len(), 4);
        assert!(config.snapshot.ends_with("csv"));
    }

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.opportunity_threshold, 30.0);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "xlsx".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("table, json, markdown, csv"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_output_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");

        let parsed: OutputFormat = serde_json::from_str("\"markdown\"").unwrap();
        assert_eq!(parsed, OutputFormat::Markdown);
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            snapshot = "/srv/prices"
            opportunity_threshold = 25.0
            reference = "runner-up"
            sort = "savings"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.snapshot, PathBuf::from("/srv/prices"));
        assert_eq!(config.opportunity_threshold, 25.0);
        assert_eq!(config.reference, ReferenceBaseline::RunnerUp);
        assert_eq!(config.sort, SortOrder::Savings);
        // Unset fields fall back to defaults
        assert!(config.match_brand);
        assert_eq!(config.markets.len(), 4);
    }

    #[test]
    fn test_config_from_toml_all_fields() {
        let toml = r#"
            snapshot = "prices.csv"
            format = "json"
            currency = "€"
            opportunity_threshold = 40.0
            reference = "average"
            match_brand = false
            sort = "first-seen"
            watch_interval_secs = 60

            [[markets]]
            name = "Carrefour"
            url = "https://www.carrefour.com.br/ofertas"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.snapshot, PathBuf::from("prices.csv"));
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.currency, "€");
        assert_eq!(config.opportunity_threshold, 40.0);
        assert_eq!(config.reference, ReferenceBaseline::Average);
        assert!(!config.match_brand);
        assert_eq!(config.watch_interval_secs, 60);
        assert_eq!(config.markets.len(), 1);
        assert_eq!(config.markets[0].name, "Carrefour");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "opportunity_threshold = 35.0").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.opportunity_threshold, 35.0);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "currency = \"US$\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.currency, "US$");
    }

    #[test]
    fn test_config_with_env() {
        let orig_snapshot = std::env::var("MKT_SNAPSHOT").ok();
        let orig_threshold = std::env::var("MKT_THRESHOLD").ok();
        let orig_format = std::env::var("MKT_FORMAT").ok();

        std::env::set_var("MKT_SNAPSHOT", "/tmp/prices");
        std::env::set_var("MKT_THRESHOLD", "not_a_number");
        std::env::set_var("MKT_FORMAT", "markdown");

        let config = Config::new().with_env();
        assert_eq!(config.snapshot, PathBuf::from("/tmp/prices"));
        // Invalid values are ignored
        assert_eq!(config.opportunity_threshold, 30.0);
        assert_eq!(config.format, OutputFormat::Markdown);

        std::env::set_var("MKT_THRESHOLD", "45");
        let config = Config::new().with_env();
        assert_eq!(config.opportunity_threshold, 45.0);

        for (key, orig) in [
            ("MKT_SNAPSHOT", orig_snapshot),
            ("MKT_THRESHOLD", orig_threshold),
            ("MKT_FORMAT", orig_format),
        ] {
            match orig {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.opportunity_threshold = 150.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.watch_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watch interval"));
    }

    #[test]
    fn test_comparison_options() {
        let mut config = Config::default();
        config.opportunity_threshold = 20.0;
        config.reference = ReferenceBaseline::Average;

        let options = config.comparison_options().unwrap();
        assert_eq!(options.opportunity_threshold, 20.0);
        assert_eq!(options.reference, ReferenceBaseline::Average);
    }
}
