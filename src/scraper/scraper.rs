// scraper.rs
use crate::domain::listing::ListingRecord;
use crate::net::Transport;
use crate::scraper::extract::parse_page;
use crate::scraper::ScraperError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const BROWSER_HEADERS: [(&str, &str); 3] = [
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "pt-BR,pt;q=0.9,en;q=0.8"),
    ("Referer", "https://www.olx.com.br/"),
];

/// Filters for one marketplace search. `None` filters are left off the request.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub term: String,
    pub max_pages: u32,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    /// Two-letter state code; `BR` or anything else means nationwide.
    pub region: Option<String>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, max_pages: u32) -> Self {
        Self {
            term: term.into(),
            max_pages,
            ..Default::default()
        }
    }

    /// Query string for one results page.
    pub fn page_params(&self, page: u32) -> Vec<(String, String)> {
        let mut params = vec![
            ("q".to_string(), self.term.clone()),
            ("o".to_string(), page.to_string()),
        ];

        let optional = [
            ("ps", self.min_price.map(|v| v.to_string())),
            ("pe", self.max_price.map(|v| v.to_string())),
            ("rs", self.min_year.map(|v| v.to_string())),
            ("re", self.max_year.map(|v| v.to_string())),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.push((key.to_string(), value));
            }
        }

        params
    }

    fn state_code(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|uf| uf.chars().count() == 2 && !uf.eq_ignore_ascii_case("BR"))
    }
}

pub struct ListingFetcher {
    transport: Arc<dyn Transport>,
    base_url: String,
    page_delay: Duration,
    page_jitter: Duration,
}

impl ListingFetcher {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            page_delay: Duration::ZERO,
            page_jitter: Duration::ZERO,
        }
    }

    pub fn with_page_delay(mut self, delay: Duration, jitter: Duration) -> Self {
        self.page_delay = delay;
        self.page_jitter = jitter;
        self
    }

    /// Search URL, narrowed to one state when the query names one.
    pub fn endpoint(&self, query: &SearchQuery) -> Result<Url, ScraperError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ScraperError::Url(e.to_string()))?;

        if let Some(uf) = query.state_code() {
            url.path_segments_mut()
                .map_err(|_| ScraperError::Url(self.base_url.clone()))?
                .pop_if_empty()
                .push(&format!("estado-{}", uf.to_lowercase()));
        }

        Ok(url)
    }

    /// Walks result pages in order until one comes back empty or fails.
    /// Failures end the walk; whatever was collected so far is returned.
    pub fn search(&self, query: &SearchQuery) -> Vec<ListingRecord> {
        let url = match self.endpoint(query) {
            Ok(url) => url,
            Err(e) => {
                warn!("cannot build search URL: {e}");
                return Vec::new();
            }
        };

        info!(
            "search region: {}",
            query.state_code().unwrap_or("nationwide")
        );

        let mut listings = Vec::new();

        for page in 1..=query.max_pages {
            if page > 1 {
                self.pause();
            }

            info!("searching '{}' (page {page})", query.term);

            match self.fetch_page(url.as_str(), &query.page_params(page)) {
                Ok(found) if found.is_empty() => {
                    info!("no listings on page {page}, stopping");
                    break;
                }
                Ok(found) => {
                    info!("page {page}: {} listings", found.len());
                    listings.extend(found);
                }
                Err(e) => {
                    warn!("page {page} failed: {e}");
                    break;
                }
            }
        }

        listings
    }

    fn fetch_page(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Vec<ListingRecord>, ScraperError> {
        let resp = self.transport.get(url, params, &BROWSER_HEADERS)?;

        if !resp.is_success() {
            return Err(ScraperError::Status(resp.status));
        }

        Ok(parse_page(&resp.body))
    }

    fn pause(&self) {
        let jitter_ms = self.page_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };

        let wait = self.page_delay + Duration::from_millis(jitter);
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }
}
