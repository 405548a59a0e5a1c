pub mod analysis;
pub mod listing;
pub mod text;

pub use analysis::Scorer;
pub use listing::{ListingRecord, PriceScore};
