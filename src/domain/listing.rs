// src/domain/listing.rs

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Categorical pricing verdict attached to a listing by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PriceScore {
    #[default]
    Neutral,
    Excellent,
    Good,
    Expensive,
    Caution,
}

impl PriceScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceScore::Neutral => "Neutral",
            PriceScore::Excellent => "Excellent",
            PriceScore::Good => "Good",
            PriceScore::Expensive => "Expensive",
            PriceScore::Caution => "Caution",
        }
    }
}

impl fmt::Display for PriceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One marketplace ad, flattened and normalized.
///
/// Created unscored by the fetcher; `tags`, `price_score` and
/// `annual_mileage` are filled in once by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRecord {
    pub id: String,
    pub title: String,
    /// Always `>= 0`.
    pub price: f64,
    pub model_year: Option<i32>,
    pub mileage_km: Option<i64>,
    pub transmission: String,
    pub fuel_type: String,
    pub city: String,
    pub region: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,

    // === Filled by the scorer ===
    pub tags: Vec<String>,
    pub price_score: PriceScore,
    pub annual_mileage: i64,
}

impl ListingRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price: 0.0,
            model_year: None,
            mileage_km: None,
            transmission: "N/A".to_string(),
            fuel_type: "N/A".to_string(),
            city: String::new(),
            region: String::new(),
            url: String::new(),
            image_url: None,
            published_at: None,
            tags: Vec::new(),
            price_score: PriceScore::Neutral,
            annual_mileage: 0,
        }
    }

    /// Sets the price from any JSON shape the source sends, coercing to `>= 0`.
    pub fn with_price(mut self, raw: &Value) -> Self {
        self.price = parse_price(raw);
        self
    }
}

/// Parses "R$ 45.900,00" style strings. `None` when nothing numeric is left.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned = raw
        .replace("R$", "")
        .replace('.', "")
        .replace(',', ".")
        .trim()
        .to_string();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lenient price coercion: numbers pass through, currency strings are parsed,
/// everything else (and anything negative) becomes `0.0`.
pub fn parse_price(raw: &Value) -> f64 {
    let value = match raw {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_currency(s).unwrap_or(0.0),
        _ => 0.0,
    };

    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_brazilian_currency() {
        assert_eq!(parse_price(&json!("R$ 45.900,00")), 45900.0);
        assert_eq!(parse_price(&json!("R$ 1.234.567,89")), 1234567.89);
        assert_eq!(parse_price(&json!("32.500")), 32500.0);
    }

    #[test]
    fn empty_or_garbage_price_is_zero() {
        assert_eq!(parse_price(&json!("")), 0.0);
        assert_eq!(parse_price(&json!("R$ ")), 0.0);
        assert_eq!(parse_price(&json!("a combinar")), 0.0);
        assert_eq!(parse_price(&Value::Null), 0.0);
        assert_eq!(parse_price(&json!(["R$ 10"])), 0.0);
    }

    #[test]
    fn numeric_price_passes_through() {
        assert_eq!(parse_price(&json!(45900)), 45900.0);
        assert_eq!(parse_price(&json!(45900.5)), 45900.5);
    }

    #[test]
    fn negative_price_is_clamped() {
        assert_eq!(parse_price(&json!(-10)), 0.0);
        assert_eq!(parse_price(&json!("-5,00")), 0.0);
    }

    #[test]
    fn new_record_has_defaults() {
        let rec = ListingRecord::new("1", "Civic").with_price(&json!("R$ 10.000"));

        assert_eq!(rec.price, 10000.0);
        assert_eq!(rec.transmission, "N/A");
        assert_eq!(rec.fuel_type, "N/A");
        assert_eq!(rec.price_score, PriceScore::Neutral);
        assert!(rec.city.is_empty());
        assert!(rec.tags.is_empty());
    }
}
