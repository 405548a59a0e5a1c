// errors.rs
use crate::spreadsheets::ExportError;
use thiserror::Error;

/// Rejected search input. Raised before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("type a model to search for (e.g. Honda Civic)")]
    EmptyQuery,
    #[error("year must be numeric (e.g. 2020), got '{0}'")]
    BadYear(String),
    #[error("page count must be between 1 and {max}, got {got}")]
    BadPageCount { got: u32, max: u32 },
}

/// The only failures a pipeline run surfaces to its caller.
/// Everything below the orchestrator degrades to partial results instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("no vehicles found")]
    NoVehiclesFound,
    #[error("a search is already running")]
    AlreadyRunning,
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("unexpected failure: {0}")]
    Internal(String),
}
