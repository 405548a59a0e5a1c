// client.rs
use crate::fipe::models::{Brand, CatalogModel, ModelYear, ModelsResponse, PriceQuote};
use crate::fipe::FipeError;
use crate::net::Transport;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

const CATALOG_USER_AGENT: &str = "motor_scout/0.1";

/// Brand -> model -> model-year -> price hierarchy of the reference catalog.
pub trait ReferenceCatalog: Send + Sync {
    fn brands(&self) -> Result<Vec<Brand>, FipeError>;
    fn models(&self, brand: &str) -> Result<Vec<CatalogModel>, FipeError>;
    fn years(&self, brand: &str, model: &str) -> Result<Vec<ModelYear>, FipeError>;
    fn price(&self, brand: &str, model: &str, year: &str) -> Result<PriceQuote, FipeError>;
}

/// REST client for the parallelum FIPE mirror (cars only).
pub struct FipeClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl FipeClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FipeError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("FIPE GET {url}");

        let resp = self
            .transport
            .get(&url, &[], &[("User-Agent", CATALOG_USER_AGENT)])?;

        if !resp.is_success() {
            return Err(FipeError::Status(resp.status));
        }

        Ok(serde_json::from_str(&resp.body)?)
    }
}

impl ReferenceCatalog for FipeClient {
    fn brands(&self) -> Result<Vec<Brand>, FipeError> {
        self.get_json("/carros/marcas")
    }

    fn models(&self, brand: &str) -> Result<Vec<CatalogModel>, FipeError> {
        let resp: ModelsResponse = self.get_json(&format!("/carros/marcas/{brand}/modelos"))?;
        Ok(resp.modelos)
    }

    fn years(&self, brand: &str, model: &str) -> Result<Vec<ModelYear>, FipeError> {
        self.get_json(&format!("/carros/marcas/{brand}/modelos/{model}/anos"))
    }

    fn price(&self, brand: &str, model: &str, year: &str) -> Result<PriceQuote, FipeError> {
        self.get_json(&format!(
            "/carros/marcas/{brand}/modelos/{model}/anos/{year}"
        ))
    }
}
