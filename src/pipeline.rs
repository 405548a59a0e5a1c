// pipeline.rs
use crate::config::{Config, MAX_PAGES};
use crate::domain::{ListingRecord, PriceScore, Scorer};
use crate::errors::{InputError, PipelineError};
use crate::fipe::{FipeClient, PriceResolver, ReferenceCatalog, ReferencePrice, YEAR_NOT_PROVIDED};
use crate::net::Transport;
use crate::scraper::{ListingFetcher, SearchQuery};
use chrono::{Datelike, Local};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use tracing::{error, info};

/// What the user asked for.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// "Brand model" text, used for both the catalog and the marketplace.
    pub model: String,
    /// Engine filter ("1.0", "Turbo"...) appended to the marketplace search only.
    pub engine: Option<String>,
    /// City appended to the marketplace search only.
    pub city: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub price_min: Option<u32>,
    pub price_max: Option<u32>,
    pub region: Option<String>,
    pub pages: u32,
}

impl SearchRequest {
    pub fn new(model: impl Into<String>, pages: u32) -> Self {
        Self {
            model: model.into(),
            pages,
            ..Default::default()
        }
    }

    /// Marketplace search term: model, then engine, then city.
    pub fn listing_term(&self) -> String {
        [Some(self.model.as_str()), self.engine.as_deref(), self.city.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.model.trim().is_empty() {
            return Err(InputError::EmptyQuery);
        }
        if self.pages == 0 || self.pages > MAX_PAGES {
            return Err(InputError::BadPageCount {
                got: self.pages,
                max: MAX_PAGES,
            });
        }
        Ok(())
    }

    fn to_query(&self) -> SearchQuery {
        SearchQuery {
            min_price: self.price_min,
            max_price: self.price_max,
            min_year: self.year_min.filter(|&y| y != 0),
            max_year: self.year_max.filter(|&y| y != 0),
            region: self.region.clone(),
            ..SearchQuery::new(self.listing_term(), self.pages)
        }
    }
}

/// Parses a year typed by the user. Blank means "not given".
pub fn parse_year(raw: &str) -> Result<Option<i32>, InputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i32>()
        .map(Some)
        .map_err(|_| InputError::BadYear(raw.to_string()))
}

/// Side-channel checkpoints for a caller that wants to stay responsive.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    ReferenceLookupStarted { query: String, year: i32 },
    ReferenceLookupDone(ReferencePrice),
    ListingSearchStarted { term: String },
    Done { count: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub reference: ReferencePrice,
    pub listings: Vec<ListingRecord>,
}

#[derive(Debug)]
pub enum PipelineEvent {
    Progress(Progress),
    Finished(Result<RunReport, PipelineError>),
}

/// Excellent first, then Good, then everything else in fetch order.
pub fn rank(listings: &mut [ListingRecord]) {
    listings.sort_by_key(|l| {
        (
            l.price_score != PriceScore::Excellent,
            l.price_score != PriceScore::Good,
        )
    });
}

pub struct Pipeline {
    resolver: PriceResolver,
    fetcher: ListingFetcher,
    current_year: i32,
    busy: AtomicBool,
}

impl Pipeline {
    pub fn new(resolver: PriceResolver, fetcher: ListingFetcher) -> Self {
        Self {
            resolver,
            fetcher,
            current_year: Local::now().year(),
            busy: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let catalog: Box<dyn ReferenceCatalog> =
            Box::new(FipeClient::new(transport.clone(), config.fipe_url.clone()));
        let fetcher = ListingFetcher::new(transport, config.olx_url.clone())
            .with_page_delay(config.page_delay, config.page_jitter);

        Self::new(PriceResolver::new(catalog), fetcher)
    }

    #[cfg(test)]
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs one search end to end. Only one run may be in flight per pipeline;
    /// the pipeline is ready again when this returns, whatever the outcome.
    pub fn run(
        &self,
        request: &SearchRequest,
        on_progress: &mut dyn FnMut(Progress),
    ) -> Result<RunReport, PipelineError> {
        let _guard = BusyGuard::acquire(&self.busy).ok_or(PipelineError::AlreadyRunning)?;

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_inner(request, on_progress)))
            .unwrap_or_else(|payload| Err(PipelineError::Internal(panic_message(payload))));

        if let Err(e) = &result {
            error!("search failed: {e}");
        }
        result
    }

    /// Runs on a worker thread; progress and the final result arrive on the
    /// returned channel.
    pub fn run_in_background(self: &Arc<Self>, request: SearchRequest) -> Receiver<PipelineEvent> {
        let (tx, rx) = mpsc::channel();
        let pipeline = Arc::clone(self);

        std::thread::spawn(move || {
            let progress_tx = tx.clone();
            let result = pipeline.run(&request, &mut |p| {
                let _ = progress_tx.send(PipelineEvent::Progress(p));
            });
            let _ = tx.send(PipelineEvent::Finished(result));
        });

        rx
    }

    fn run_inner(
        &self,
        request: &SearchRequest,
        on_progress: &mut dyn FnMut(Progress),
    ) -> Result<RunReport, PipelineError> {
        request.validate()?;

        // Year 0 means "not given", same as a blank field.
        let reference = match request.year_min.filter(|&year| year != 0) {
            Some(year) => {
                on_progress(Progress::ReferenceLookupStarted {
                    query: request.model.clone(),
                    year,
                });
                let reference = self.resolver.resolve(&request.model, year);
                on_progress(Progress::ReferenceLookupDone(reference.clone()));
                reference
            }
            None => ReferencePrice::missing(YEAR_NOT_PROVIDED),
        };

        let query = request.to_query();
        on_progress(Progress::ListingSearchStarted {
            term: query.term.clone(),
        });

        let raw = self.fetcher.search(&query);
        if raw.is_empty() {
            return Err(PipelineError::NoVehiclesFound);
        }

        let scorer = Scorer::new(reference.average, self.current_year);
        let mut listings: Vec<ListingRecord> = raw.into_iter().map(|l| scorer.score(l)).collect();
        rank(&mut listings);

        info!("{} vehicles analysed", listings.len());
        on_progress(Progress::Done {
            count: listings.len(),
        });

        Ok(RunReport {
            reference,
            listings,
        })
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
