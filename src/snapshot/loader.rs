//! CSV parsing of price observation snapshots.

use crate::error::{Error, Result};
use crate::observation::{PriceObservation, Snapshot};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::{debug, warn};

// Accepted header names per column, English first, then the acquisition
// process's Portuguese names.
const PRODUCT: &[&str] = &["product_name", "product", "produto"];
const BRAND: &[&str] = &["brand", "marca"];
const QUANTITY: &[&str] = &["quantity", "quantidade", "qtd"];
const PRICE: &[&str] = &["unit_price", "price", "preco"];
const MARKET: &[&str] = &["market", "mercado"];
const EXTRACTED_AT: &[&str] = &["extracted_at", "data_extracao"];
const SEGMENT: &[&str] = &["segment", "segmento"];
const SOURCE_URL: &[&str] = &["source_url", "url_fonte"];

/// Column positions resolved from the header row.
struct Columns {
    product: usize,
    brand: Option<usize>,
    quantity: usize,
    price: usize,
    market: usize,
    extracted_at: usize,
    segment: Option<usize>,
    source_url: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        let require = |aliases: &[&'static str]| find(aliases).ok_or(Error::MissingColumn(aliases[0]));

        Ok(Self {
            product: require(PRODUCT)?,
            brand: find(BRAND),
            quantity: require(QUANTITY)?,
            price: require(PRICE)?,
            market: require(MARKET)?,
            extracted_at: require(EXTRACTED_AT)?,
            segment: find(SEGMENT),
            source_url: find(SOURCE_URL),
        })
    }
}

fn cell(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or("")
}

fn optional_cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index.map(|i| cell(record, i)).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Parses a CSV snapshot.
///
/// Missing required columns, blank product or market cells and unreadable
/// timestamps are errors. Rows whose price is not a number are skipped.
pub fn parse_snapshot<R: Read>(reader: R, source: &str) -> Result<Snapshot> {
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        let product_name = cell(&record, columns.product);
        if product_name.is_empty() {
            return Err(Error::InvalidRecord { line, reason: "empty product name".into() });
        }

        let market = cell(&record, columns.market);
        if market.is_empty() {
            return Err(Error::InvalidRecord { line, reason: "empty market".into() });
        }

        let raw_timestamp = cell(&record, columns.extracted_at);
        let extracted_at = parse_timestamp(raw_timestamp).ok_or_else(|| Error::InvalidRecord {
            line,
            reason: format!("invalid timestamp '{}'", raw_timestamp),
        })?;

        let raw_price = cell(&record, columns.price);
        let Some(unit_price) = parse_price(raw_price) else {
            warn!("Skipping line {}: price '{}' is not a number", line, raw_price);
            skipped += 1;
            continue;
        };

        observations.push(PriceObservation {
            product_name: product_name.to_string(),
            brand: columns.brand.map(|i| cell(&record, i)).unwrap_or("").to_string(),
            quantity: cell(&record, columns.quantity).to_string(),
            unit_price,
            market: market.to_string(),
            extracted_at,
            segment: optional_cell(&record, columns.segment),
            source_url: optional_cell(&record, columns.source_url),
        });
    }

    if skipped > 0 {
        warn!("Skipped {} rows with unreadable prices in {}", skipped, source);
    }
    debug!("Loaded {} observations from {}", observations.len(), source);

    Ok(Snapshot::new(source, observations))
}

/// Parses a price cell such as `10.50`, `10,50`, `R$ 10,50`, `1.234,56` or `1.234`.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    // Whichever separator comes last is the decimal separator
    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if is_thousands_grouping(&cleaned, '.') => cleaned.replace('.', ""),
        (None, Some(_)) if is_thousands_grouping(&cleaned, ',') => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalized.parse().ok()
}

/// True for "1.234" or "12.345.678": a leading group of 1-3 digits not
/// starting with zero, then groups of exactly three digits.
///
/// A single comma stays a decimal separator ("10,500" is 10.5).
fn is_thousands_grouping(text: &str, separator: char) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut groups = digits.split(separator);
    let Some(lead) = groups.next() else {
        return false;
    };

    let rest: Vec<&str> = groups.collect();
    if separator == ',' && rest.len() < 2 {
        return false;
    }

    (1..=3).contains(&lead.len())
        && !lead.starts_with('0')
        && lead.chars().all(|c| c.is_ascii_digit())
        && rest.iter().all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Parses RFC 3339, ISO-like naive date-times, `YYYY-MM-DD` and `DD/MM/YYYY`.
///
/// Naive values are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ENGLISH: &str = "\
product_name,brand,quantity,unit_price,market,extracted_at
Rice,BrandX,1kg,10.00,MarketA,2024-03-01T08:00:00Z
Rice,BrandX,1kg,15.00,MarketB,2024-03-01 09:30:00
";

    const PORTUGUESE: &str = "\
segmento,produto,marca,quantidade,preco,preco_oferta,mercado,data_extracao,url_fonte
Mercearia,Arroz Branco,Tio João,5kg,\"24,90\",\"24,90\",Guanabara,2024-03-02,https://www.supermercadosguanabara.com.br/encarte
Hortifruti,Tomate,,1kg,R$ 7.49,,Mundial,02/03/2024,
";

    #[test]
    fn test_parse_english_headers() {
        let snapshot = parse_snapshot(ENGLISH.as_bytes(), "english.csv").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.source, "english.csv");

        let first = &snapshot.observations()[0];
        assert_eq!(first.product_name, "Rice");
        assert_eq!(first.brand, "BrandX");
        assert_eq!(first.quantity, "1kg");
        assert_eq!(first.unit_price, 10.0);
        assert_eq!(first.market, "MarketA");
        assert_eq!(first.extracted_at, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
        assert!(first.segment.is_none());

        let second = &snapshot.observations()[1];
        assert_eq!(second.extracted_at, Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_portuguese_headers() {
        let snapshot = parse_snapshot(PORTUGUESE.as_bytes(), "produtos.csv").unwrap();
        assert_eq!(snapshot.len(), 2);

        let rice = &snapshot.observations()[0];
        assert_eq!(rice.product_name, "Arroz Branco");
        assert_eq!(rice.unit_price, 24.9);
        assert_eq!(rice.segment.as_deref(), Some("Mercearia"));
        assert_eq!(
            rice.source_url.as_deref(),
            Some("https://www.supermercadosguanabara.com.br/encarte")
        );

        let tomato = &snapshot.observations()[1];
        assert_eq!(tomato.brand, "");
        assert_eq!(tomato.unit_price, 7.49);
        assert_eq!(tomato.extracted_at, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
        assert!(tomato.source_url.is_none());
    }

    #[test]
    fn test_brand_column_optional() {
        let csv = "product,quantity,price,market,extracted_at\nMilk,1L,6.00,MarketA,2024-01-01\n";
        let snapshot = parse_snapshot(csv.as_bytes(), "t").unwrap();
        assert_eq!(snapshot.observations()[0].brand, "");
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "product_name,brand,quantity,market,extracted_at\nRice,X,1kg,A,2024-01-01\n";
        let err = parse_snapshot(csv.as_bytes(), "t").unwrap_err();
        assert!(matches!(err, Error::MissingColumn("unit_price")));
        assert!(err.to_string().contains("unit_price"));
    }

    #[test]
    fn test_empty_market_is_invalid_record() {
        let csv = "product,quantity,price,market,extracted_at\nMilk,1L,6.00,,2024-01-01\n";
        let err = parse_snapshot(csv.as_bytes(), "t").unwrap_err();
        match err {
            Error::InvalidRecord { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("market"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_timestamp_is_invalid_record() {
        let csv = "product,quantity,price,market,extracted_at\nMilk,1L,6.00,A,yesterday\n";
        let err = parse_snapshot(csv.as_bytes(), "t").unwrap_err();
        assert!(err.to_string().contains("invalid timestamp 'yesterday'"));
    }

    #[test]
    fn test_non_numeric_price_skipped() {
        let csv = "\
product,quantity,price,market,extracted_at
Milk,1L,consulte,A,2024-01-01
Milk,1L,,B,2024-01-01
Milk,1L,5.50,C,2024-01-01
";
        let snapshot = parse_snapshot(csv.as_bytes(), "t").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.observations()[0].market, "C");
    }

    #[test]
    fn test_zero_price_kept_for_engine() {
        let csv = "product,quantity,price,market,extracted_at\nMilk,1L,0,A,2024-01-01\n";
        let snapshot = parse_snapshot(csv.as_bytes(), "t").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.observations()[0].has_valid_price());
    }

    #[test]
    fn test_blank_rows_ignored() {
        let csv = "product,quantity,price,market,extracted_at\n,,,,\nMilk,1L,5,A,2024-01-01\n";
        let snapshot = parse_snapshot(csv.as_bytes(), "t").unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_headers_only() {
        let csv = "product,quantity,price,market,extracted_at\n";
        let snapshot = parse_snapshot(csv.as_bytes(), "t").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("10.50"), Some(10.5));
        assert_eq!(parse_price("10,50"), Some(10.5));
        assert_eq!(parse_price("R$ 10,50"), Some(10.5));
        assert_eq!(parse_price("1.234,56"), Some(1234.56));
        assert_eq!(parse_price("1,234.56"), Some(1234.56));
        assert_eq!(parse_price("7"), Some(7.0));
        assert_eq!(parse_price("-2.00"), Some(-2.0));
        assert_eq!(parse_price("7.49"), Some(7.49));
        assert_eq!(parse_price("0.500"), Some(0.5));
        assert_eq!(parse_price("10,500"), Some(10.5));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("R$"), None);
        assert_eq!(parse_price("n/a"), None);
    }

    #[test]
    fn test_parse_price_thousands_only() {
        assert_eq!(parse_price("1.234"), Some(1234.0));
        assert_eq!(parse_price("R$ 1.234"), Some(1234.0));
        assert_eq!(parse_price("12.345.678"), Some(12345678.0));
        assert_eq!(parse_price("1,234,567"), Some(1234567.0));
        assert_eq!(parse_price("1.2345"), Some(1.2345));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 14, 20, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T14:20:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T11:20:00-03:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:20:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:20:00.000"), Some(expected));
        assert_eq!(parse_timestamp("05/03/2024 14:20:00"), Some(expected));

        let midnight = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05"), Some(midnight));
        assert_eq!(parse_timestamp("05/03/2024"), Some(midnight));

        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }
}
