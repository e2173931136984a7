//! Output formatting for comparisons, statistics and carts (table, JSON, markdown, CSV).

use crate::cart::CartPlan;
use crate::config::OutputFormat;
use crate::engine::{ComparisonGroup, Statistics};
use crate::observation::PriceObservation;
use tracing::warn;

const GROUPS_CSV_HEADER: [&str; 11] = [
    "product",
    "brand",
    "quantity",
    "segment",
    "min_price",
    "min_price_market",
    "reference_price",
    "savings_amount",
    "savings_percent",
    "is_opportunity",
    "markets",
];
const OBSERVATIONS_CSV_HEADER: [&str; 8] =
    ["product_name", "brand", "quantity", "unit_price", "market", "extracted_at", "segment", "source_url"];
const STATISTICS_CSV_HEADER: [&str; 7] = [
    "total_products",
    "total_markets",
    "total_observations",
    "average_price",
    "min_price",
    "max_price",
    "last_refreshed_at",
];
const CART_CSV_HEADER: [&str; 5] = ["market", "product", "brand", "quantity", "price"];

/// Formats engine results for output.
pub struct Formatter {
    format: OutputFormat,
    currency: String,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat, currency: impl Into<String>) -> Self {
        Self { format, currency: currency.into() }
    }

    /// Formats comparison groups.
    pub fn format_groups(&self, groups: &[ComparisonGroup]) -> String {
        if groups.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => GROUPS_CSV_HEADER.join(","),
                _ => "No comparable products found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(groups).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_groups(groups),
            OutputFormat::Markdown => self.markdown_groups(groups),
            OutputFormat::Csv => self.csv_groups(groups),
        }
    }

    /// Formats raw observations, e.g. search hits.
    pub fn format_observations(&self, observations: &[&PriceObservation]) -> String {
        if observations.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => OBSERVATIONS_CSV_HEADER.join(","),
                _ => "No observations found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(observations).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_observations(observations),
            OutputFormat::Markdown => self.markdown_observations(observations),
            OutputFormat::Csv => self.csv_observations(observations),
        }
    }

    /// Formats snapshot statistics.
    pub fn format_statistics(&self, stats: &Statistics) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(stats).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => self.table_statistics(stats),
            OutputFormat::Markdown => self.markdown_statistics(stats),
            OutputFormat::Csv => self.csv_statistics(stats),
        }
    }

    /// Formats a cart plan.
    pub fn format_cart(&self, plan: &CartPlan) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(plan).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => self.table_cart(plan),
            OutputFormat::Markdown => self.markdown_cart(plan),
            OutputFormat::Csv => self.csv_cart(plan),
        }
    }

    fn money(&self, value: f64) -> String {
        format!("{} {:.2}", self.currency, value)
    }

    // Table formatting

    fn table_groups(&self, groups: &[ComparisonGroup]) -> String {
        let mut lines = Vec::new();

        for group in groups {
            let segment = group.segment.as_deref().map(|s| format!(" [{}]", s)).unwrap_or_default();
            lines.push(format!("📦 {}{}", group.label(), segment));

            let hot = if group.is_opportunity { " 🔥" } else { "" };
            lines.push(format!(
                "Best at {}: {}{}",
                group.min_price_market,
                self.money(group.min_price),
                hot
            ));

            for offer in &group.offers {
                let diff = offer.price - group.min_price;
                if diff == 0.0 {
                    lines.push(format!("🏆 {}: {}", offer.market, self.money(offer.price)));
                } else {
                    lines.push(format!(
                        "   {}: {} (+{}, +{:.0}%)",
                        offer.market,
                        self.money(offer.price),
                        self.money(diff),
                        diff / group.min_price * 100.0
                    ));
                }
            }

            if group.savings_amount > 0.0 {
                lines.push(format!(
                    "💰 Savings: {} ({:.0}%) vs {}",
                    self.money(group.savings_amount),
                    group.savings_percent,
                    self.money(group.reference_price)
                ));
            }

            lines.push(String::new());
        }

        let opportunities = groups.iter().filter(|g| g.is_opportunity).count();
        lines.push(format!("Total: {} products, {} opportunities", groups.len(), opportunities));

        lines.join("\n")
    }

    fn table_observations(&self, observations: &[&PriceObservation]) -> String {
        let market_width = 14;
        let price_width = 12;
        let quantity_width = 8;
        let brand_width = 16;
        let product_width = 40;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<market_width$}  {:>price_width$}  {:<quantity_width$}  {:<brand_width$}  {}",
            "Market", "Price", "Qty", "Brand", "Product"
        ));
        lines.push(format!(
            "{:-<market_width$}  {:-<price_width$}  {:-<quantity_width$}  {:-<brand_width$}  {:-<product_width$}",
            "", "", "", "", ""
        ));

        for o in observations {
            let price = if o.has_valid_price() { self.money(o.unit_price) } else { "N/A".to_string() };

            lines.push(format!(
                "{:<market_width$}  {:>price_width$}  {:<quantity_width$}  {:<brand_width$}  {}",
                truncate(o.market_name(), market_width),
                price,
                truncate(&o.quantity, quantity_width),
                truncate(&o.brand, brand_width),
                truncate(&o.product_name, product_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} observations", observations.len()));

        lines.join("\n")
    }

    fn table_statistics(&self, stats: &Statistics) -> String {
        let refreshed = stats
            .last_refreshed_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());

        let mut lines = Vec::new();
        lines.push(format!("Products:      {}", stats.total_products));
        if stats.markets.is_empty() {
            lines.push(format!("Markets:       {}", stats.total_markets));
        } else {
            lines.push(format!(
                "Markets:       {} ({})",
                stats.total_markets,
                stats.markets.join(", ")
            ));
        }
        lines.push(format!("Observations:  {}", stats.total_observations));
        lines.push(format!("Average price: {}", self.money(stats.average_price)));
        lines.push(format!("Lowest price:  {}", self.money(stats.min_price)));
        lines.push(format!("Highest price: {}", self.money(stats.max_price)));
        lines.push(format!("Last refresh:  {}", refreshed));

        lines.join("\n")
    }

    fn table_cart(&self, plan: &CartPlan) -> String {
        let mut lines = Vec::new();

        if plan.is_empty() {
            lines.push("Nothing in the cart matched the snapshot.".to_string());
        }

        for (market, cart_lines) in &plan.lines_by_market {
            let total = plan.totals_by_market.get(market).copied().unwrap_or_default();
            lines.push(format!("🛒 {}: {}", market, self.money(total)));
            for line in cart_lines {
                let label = [line.product_name.as_str(), line.brand.as_str(), line.quantity.as_str()]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ");
                lines.push(format!("   {:<40} {}", truncate(&label, 40), self.money(line.price)));
            }
            lines.push(String::new());
        }

        if let Some(market) = &plan.cheapest_market {
            lines.push(format!("🏆 Cheapest market: {} ({})", market, self.money(plan.cheapest_total)));
            lines.push(format!("💰 Spread between markets: {}", self.money(plan.total_spread)));
            lines.push(format!("Split cart total: {}", self.money(plan.split_total())));
        }

        if !plan.unmatched.is_empty() {
            let names: Vec<String> = plan.unmatched.iter().map(|i| i.to_string()).collect();
            lines.push(format!("⚠️ Not found: {}", names.join(", ")));
        }

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_groups(&self, groups: &[ComparisonGroup]) -> String {
        let mut lines = Vec::new();

        lines.push(
            "| Product | Lowest | Market | Reference | Savings | Savings % | Markets | Opportunity |"
                .to_string(),
        );
        lines.push(
            "|---------|--------|--------|-----------|---------|-----------|---------|-------------|"
                .to_string(),
        );

        for group in groups {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {:.1}% | {} | {} |",
                group.label(),
                self.money(group.min_price),
                group.min_price_market,
                self.money(group.reference_price),
                self.money(group.savings_amount),
                group.savings_percent,
                group.offer_count(),
                if group.is_opportunity { "🔥" } else { "" }
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} products compared*", groups.len()));

        lines.join("\n")
    }

    fn markdown_observations(&self, observations: &[&PriceObservation]) -> String {
        let mut lines = Vec::new();

        lines.push("| Market | Price | Product | Brand | Qty | Extracted |".to_string());
        lines.push("|--------|-------|---------|-------|-----|-----------|".to_string());

        for o in observations {
            let product = match &o.source_url {
                Some(url) => format!("[{}]({})", o.product_name, url),
                None => o.product_name.clone(),
            };
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} |",
                o.market_name(),
                self.money(o.unit_price),
                product,
                o.brand,
                o.quantity,
                o.extracted_at.format("%Y-%m-%d %H:%M")
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} observations found*", observations.len()));

        lines.join("\n")
    }

    fn markdown_statistics(&self, stats: &Statistics) -> String {
        let mut lines = Vec::new();

        lines.push("## Snapshot statistics".to_string());
        lines.push(String::new());
        lines.push(format!("- **Products:** {}", stats.total_products));
        lines.push(format!("- **Markets:** {}", stats.total_markets));
        lines.push(format!("- **Observations:** {}", stats.total_observations));
        lines.push(format!("- **Average price:** {}", self.money(stats.average_price)));
        lines.push(format!("- **Lowest price:** {}", self.money(stats.min_price)));
        lines.push(format!("- **Highest price:** {}", self.money(stats.max_price)));
        if let Some(at) = stats.last_refreshed_at {
            lines.push(format!("- **Last refresh:** {}", at.to_rfc3339()));
        }

        lines.join("\n")
    }

    fn markdown_cart(&self, plan: &CartPlan) -> String {
        let mut lines = Vec::new();

        lines.push("| Market | Product | Price |".to_string());
        lines.push("|--------|---------|-------|".to_string());

        for (market, cart_lines) in &plan.lines_by_market {
            for line in cart_lines {
                lines.push(format!(
                    "| {} | {} {} {} | {} |",
                    market,
                    line.product_name,
                    line.brand,
                    line.quantity,
                    self.money(line.price)
                ));
            }
        }

        lines.push(String::new());
        if let Some(market) = &plan.cheapest_market {
            lines.push(format!(
                "**Cheapest market:** {} ({}), spread {}",
                market,
                self.money(plan.cheapest_total),
                self.money(plan.total_spread)
            ));
        }
        if !plan.unmatched.is_empty() {
            let names: Vec<String> = plan.unmatched.iter().map(|i| i.to_string()).collect();
            lines.push(format!("*Not found: {}*", names.join(", ")));
        }

        lines.join("\n")
    }

    // CSV formatting

    fn csv_groups(&self, groups: &[ComparisonGroup]) -> String {
        render_csv(
            &GROUPS_CSV_HEADER,
            groups.iter().map(|group| {
                vec![
                    group.product_name.clone(),
                    group.brand.clone(),
                    group.quantity.clone(),
                    group.segment.clone().unwrap_or_default(),
                    format!("{:.2}", group.min_price),
                    group.min_price_market.clone(),
                    format!("{:.2}", group.reference_price),
                    format!("{:.2}", group.savings_amount),
                    format!("{:.2}", group.savings_percent),
                    group.is_opportunity.to_string(),
                    group.markets().join(";"),
                ]
            }),
        )
    }

    fn csv_observations(&self, observations: &[&PriceObservation]) -> String {
        render_csv(
            &OBSERVATIONS_CSV_HEADER,
            observations.iter().map(|o| {
                vec![
                    o.product_name.clone(),
                    o.brand.clone(),
                    o.quantity.clone(),
                    o.unit_price.to_string(),
                    o.market.clone(),
                    o.extracted_at.to_rfc3339(),
                    o.segment.clone().unwrap_or_default(),
                    o.source_url.clone().unwrap_or_default(),
                ]
            }),
        )
    }

    fn csv_statistics(&self, stats: &Statistics) -> String {
        let row = vec![
            stats.total_products.to_string(),
            stats.total_markets.to_string(),
            stats.total_observations.to_string(),
            format!("{:.2}", stats.average_price),
            format!("{:.2}", stats.min_price),
            format!("{:.2}", stats.max_price),
            stats.last_refreshed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        ];
        render_csv(&STATISTICS_CSV_HEADER, [row])
    }

    fn csv_cart(&self, plan: &CartPlan) -> String {
        render_csv(
            &CART_CSV_HEADER,
            plan.lines_by_market.iter().flat_map(|(market, lines)| {
                lines.iter().map(move |line| {
                    vec![
                        market.clone(),
                        line.product_name.clone(),
                        line.brand.clone(),
                        line.quantity.clone(),
                        format!("{:.2}", line.price),
                    ]
                })
            }),
        )
    }
}

/// Renders a header and rows as CSV text without the final line terminator.
fn render_csv<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    write_csv(header, rows).unwrap_or_else(|e| {
        warn!("Failed to render CSV: {}", e);
        header.join(",")
    })
}

fn write_csv<I>(header: &[&str], rows: I) -> csv::Result<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.trim_end_matches('\n').to_string())
}

/// Shortens `s` to at most `width` characters, ending in "...".
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}
