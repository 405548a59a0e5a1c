pub mod export_xlsx;

pub use export_xlsx::{default_export_path, export_listings_xlsx, ExportError};
