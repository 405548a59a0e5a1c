use crate::net::TransportError;
use thiserror::Error;

/// Page-level failures. Any of these ends pagination but never the search.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("bad endpoint URL: {0}")]
    Url(String),
    #[error("HTML parse error: {0}")]
    HtmlParse(String),
    #[error("__NEXT_DATA__ not found")]
    MissingNextData,
    #[error("JSON parse error: {0}")]
    JsonParse(String),
    #[error("Unexpected data shape: {0}")]
    UnexpectedShape(String),
}

/// Why a single ad was left out of a page's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    NotARecord,
    MissingTitle,
    MissingId,
}
