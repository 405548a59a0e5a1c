// resolver.rs
use crate::domain::listing::parse_currency;
use crate::domain::text::normalize;
use crate::fipe::models::{Brand, CatalogModel};
use crate::fipe::{FipeError, ReferenceCatalog};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Most catalog models priced per query; each one costs two or three requests.
pub const MAX_MODEL_CANDIDATES: usize = 50;

/// Years suggested when the requested one is missing.
const MAX_YEAR_HINTS: usize = 5;

pub const YEAR_NOT_PROVIDED: &str = "year not provided";
pub const INVALID_QUERY: &str = "invalid query";
pub const BRAND_NOT_FOUND: &str = "brand not found";
pub const MODEL_NOT_FOUND: &str = "model not found";
pub const CONNECTION_ERROR: &str = "connection error";

/// Outcome of a catalog lookup. A failed lookup is `average == 0.0` with a
/// diagnostic message, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferencePrice {
    pub average: f64,
    pub message: String,
}

impl ReferencePrice {
    pub fn found(average: f64, message: impl Into<String>) -> Self {
        Self {
            average,
            message: message.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self {
            average: 0.0,
            message: message.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.average > 0.0
    }
}

pub struct PriceResolver {
    catalog: Box<dyn ReferenceCatalog>,
}

impl PriceResolver {
    pub fn new(catalog: Box<dyn ReferenceCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolves "Brand model words" for one model-year to an average price
    /// across every matching trim.
    pub fn resolve(&self, query: &str, target_year: i32) -> ReferencePrice {
        if target_year == 0 {
            return ReferencePrice::missing(YEAR_NOT_PROVIDED);
        }

        let mut tokens = query.split_whitespace();
        let Some(brand_token) = tokens.next() else {
            return ReferencePrice::missing(INVALID_QUERY);
        };
        let brand_query = normalize(brand_token);
        let model_query = normalize(&tokens.collect::<Vec<_>>().join(" "));

        info!("FIPE lookup: {query} ({target_year})");

        match self.resolve_inner(&brand_query, &model_query, target_year) {
            Ok(result) => {
                info!("FIPE result: {:.2} ({})", result.average, result.message);
                result
            }
            Err(e) => {
                warn!("FIPE lookup failed: {e}");
                ReferencePrice::missing(CONNECTION_ERROR)
            }
        }
    }

    fn resolve_inner(
        &self,
        brand_query: &str,
        model_query: &str,
        target_year: i32,
    ) -> Result<ReferencePrice, FipeError> {
        let brands = self.catalog.brands()?;
        let Some(brand) = match_brand(&brands, brand_query) else {
            info!("brand '{brand_query}' not found");
            return Ok(ReferencePrice::missing(BRAND_NOT_FOUND));
        };

        let models = self.catalog.models(&brand.codigo)?;
        let candidates = match_models(&models, model_query);
        if candidates.is_empty() {
            info!("model '{model_query}' not found under {}", brand.nome);
            return Ok(ReferencePrice::missing(MODEL_NOT_FOUND));
        }

        debug!(
            "{} candidate models under {} (pricing at most {MAX_MODEL_CANDIDATES})",
            candidates.len(),
            brand.nome
        );

        let year_text = target_year.to_string();
        let mut prices = Vec::new();
        let mut years_seen = BTreeSet::new();

        for model in candidates.iter().take(MAX_MODEL_CANDIDATES) {
            match self.price_for_year(&brand.codigo, model, &year_text, &mut years_seen) {
                Ok(Some(price)) => prices.push(price),
                Ok(None) => {}
                Err(e) => debug!("skipping {}: {e}", model.nome),
            }
        }

        if !prices.is_empty() {
            let mean = prices.iter().sum::<f64>() / prices.len() as f64;
            return Ok(ReferencePrice::found(
                mean,
                format!("Average of {} trims.", prices.len()),
            ));
        }

        let hints: Vec<String> = years_seen
            .iter()
            .rev()
            .take(MAX_YEAR_HINTS)
            .map(|y| y.to_string())
            .collect();

        if hints.is_empty() {
            Ok(ReferencePrice::missing(format!(
                "year {target_year} unavailable"
            )))
        } else {
            Ok(ReferencePrice::missing(format!(
                "not available in {target_year}. Try: {}...",
                hints.join(", ")
            )))
        }
    }

    /// Prices one candidate model for the target year, recording every year
    /// the model is offered in along the way.
    fn price_for_year(
        &self,
        brand_code: &str,
        model: &CatalogModel,
        year_text: &str,
        years_seen: &mut BTreeSet<u32>,
    ) -> Result<Option<f64>, FipeError> {
        let years = self.catalog.years(brand_code, &model.codigo)?;

        years_seen.extend(
            years
                .iter()
                .filter_map(|y| y.year_prefix())
                .filter_map(|y| y.parse::<u32>().ok()),
        );

        let Some(year) = years.iter().find(|y| y.nome.contains(year_text)) else {
            return Ok(None);
        };

        let quote = self.catalog.price(brand_code, &model.codigo, &year.codigo)?;
        let price = parse_currency(&quote.valor).ok_or(FipeError::BadPrice(quote.valor.clone()))?;
        debug!(
            "{} ({}): {}",
            quote.modelo.as_deref().unwrap_or(&model.nome),
            quote.ano_modelo.map(|y| y.to_string()).unwrap_or_else(|| year.nome.clone()),
            quote.valor
        );

        Ok(Some(price))
    }
}

/// Exact (normalized) name first, then substring; first hit in list order.
fn match_brand<'a>(brands: &'a [Brand], brand_query: &str) -> Option<&'a Brand> {
    brands
        .iter()
        .find(|b| normalize(&b.nome) == brand_query)
        .or_else(|| brands.iter().find(|b| normalize(&b.nome).contains(brand_query)))
}

/// Every query word must appear somewhere in the model name, in any order.
fn match_models<'a>(models: &'a [CatalogModel], model_query: &str) -> Vec<&'a CatalogModel> {
    let words: Vec<&str> = model_query.split_whitespace().collect();

    models
        .iter()
        .filter(|m| {
            let name = normalize(&m.nome);
            words.iter().all(|w| name.contains(w))
        })
        .collect()
}
