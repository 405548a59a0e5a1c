mod client;
mod fipe_error;
pub mod models;
mod resolver;

pub use client::{FipeClient, ReferenceCatalog};
pub use fipe_error::FipeError;
pub use resolver::{PriceResolver, ReferencePrice, YEAR_NOT_PROVIDED};

#[cfg(test)]
pub use resolver::MAX_MODEL_CANDIDATES;
