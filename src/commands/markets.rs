//! Markets command implementation.

use crate::config::{Config, OutputFormat};
use anyhow::Result;

/// Lists the configured markets.
pub fn list_markets(config: &Config) -> Result<String> {
    if config.format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&config.markets)?);
    }

    if config.markets.is_empty() {
        return Ok("No markets configured.".to_string());
    }

    let name_width = config.markets.iter().map(|m| m.name.chars().count()).max().unwrap_or(4).max(4);

    let mut lines = Vec::new();
    lines.push(format!("{:<name_width$}  {}", "Name", "URL"));
    lines.push(format!("{:-<name_width$}  {:-<40}", "", ""));
    for market in &config.markets {
        lines.push(format!("{:<name_width$}  {}", market.name, market.url));
    }

    Ok(lines.join("\n"))
}
