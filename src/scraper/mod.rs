mod extract;
mod scraper;
mod scraper_error;

pub use scraper::{ListingFetcher, SearchQuery};
pub use scraper_error::{ScraperError, SkipReason};
