// src/domain/analysis.rs

use crate::domain::listing::{ListingRecord, PriceScore};

/// Title keywords that point to a risky vehicle history
/// (auction, salvage, police record, recovered theft, re-stamped chassis...).
pub const RED_FLAGS: [&str; 9] = [
    "leilao",
    "leilão",
    "sinistro",
    "batido",
    "consta",
    "recuperado",
    "csv",
    "remarcado",
    "chassi",
];

pub const ALERT_PREFIX: &str = "ALERT: ";
pub const SUSPICIOUS_PRICE_TAG: &str = "suspicious price";
pub const BELOW_REFERENCE_TAG: &str = "below reference";
pub const ABOVE_REFERENCE_TAG: &str = "above reference";
pub const HIGH_MILEAGE_TAG: &str = "high mileage";
pub const LOW_MILEAGE_TAG: &str = "low mileage";

/// Deviation (in %) beyond which a price is a bargain or overpriced.
const PRICE_BAND_PCT: f64 = 15.0;
const HIGH_ANNUAL_KM: i64 = 25_000;
const LOW_ANNUAL_KM: i64 = 5_000;
const LOW_MILEAGE_MIN_AGE: i64 = 2;

pub fn is_alert(tag: &str) -> bool {
    tag.starts_with(ALERT_PREFIX)
}

/// Scores listings against one reference price.
///
/// Rules run in a fixed order and append tags in that order:
///
/// 1. red flags in the title -> `Caution`
/// 2. deviation from the reference -> `Excellent` / `Good` / `Expensive`
/// 3. mileage per year of age -> tags only
///
/// `Caution` is sticky: price tags are still added for a flagged listing but
/// never replace its score.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    reference_price: f64,
    current_year: i32,
}

impl Scorer {
    pub fn new(reference_price: f64, current_year: i32) -> Self {
        Self {
            reference_price,
            current_year,
        }
    }

    /// Rebuilds tags, score and annual mileage from the listing's own fields.
    /// Previous scoring output is discarded, so scoring twice is a no-op.
    pub fn score(&self, mut listing: ListingRecord) -> ListingRecord {
        let mut tags = Vec::new();
        let mut score = PriceScore::Neutral;

        let title = listing.title.to_lowercase();
        for flag in RED_FLAGS {
            if title.contains(flag) {
                tags.push(format!("{ALERT_PREFIX}{}", flag.to_uppercase()));
                score = PriceScore::Caution;
            }
        }
        let flagged = !tags.is_empty();

        if self.reference_price > 0.0 && listing.price > 0.0 {
            let pct = (listing.price - self.reference_price) / self.reference_price * 100.0;

            if pct < -PRICE_BAND_PCT {
                tags.push(format!("{}% below reference", pct.abs().trunc() as i64));
                if flagged {
                    tags.push(SUSPICIOUS_PRICE_TAG.to_string());
                } else {
                    score = PriceScore::Excellent;
                }
            } else if pct < 0.0 {
                tags.push(BELOW_REFERENCE_TAG.to_string());
                if !flagged {
                    score = PriceScore::Good;
                }
            } else if pct > PRICE_BAND_PCT {
                tags.push(ABOVE_REFERENCE_TAG.to_string());
                if !flagged {
                    score = PriceScore::Expensive;
                }
            }
        }

        let mut annual_mileage = 0;
        if let (Some(year), Some(km)) = (listing.model_year, listing.mileage_km) {
            if year != 0 && km != 0 {
                // Scraped years can be anything; widen before subtracting.
                let age = (i64::from(self.current_year) - i64::from(year)).max(1);
                annual_mileage = km.div_euclid(age);

                if annual_mileage > HIGH_ANNUAL_KM {
                    tags.push(HIGH_MILEAGE_TAG.to_string());
                } else if annual_mileage < LOW_ANNUAL_KM && age > LOW_MILEAGE_MIN_AGE {
                    tags.push(LOW_MILEAGE_TAG.to_string());
                }
            }
        }

        listing.tags = tags;
        listing.price_score = score;
        listing.annual_mileage = annual_mileage;
        listing
    }
}
