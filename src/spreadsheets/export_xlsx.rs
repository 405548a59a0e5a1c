use crate::domain::listing::ListingRecord;
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

const SHEET_NAME: &str = "Analysis";

const HEADERS: [&str; 10] = [
    "Title", "Price", "Score", "Tags", "Year", "Km", "Km/year", "City", "State", "Link",
];

/// `{dir}/analysis_{region}_{term}_{YYYYmmdd_HHMM}.xlsx`
pub fn default_export_path(dir: &Path, region: &str, term: &str, now: NaiveDateTime) -> PathBuf {
    let term = term.split_whitespace().collect::<Vec<_>>().join("_");
    dir.join(format!(
        "analysis_{}_{}_{}.xlsx",
        region,
        term,
        now.format("%Y%m%d_%H%M")
    ))
}

/// Writes ranked listings to a single-sheet workbook at `path`, creating the
/// parent directory if needed.
pub fn export_listings_xlsx(listings: &[ListingRecord], path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let currency = Format::new().set_num_format("R$ #,##0");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (i, listing) in listings.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet.write_string(r, 0, &listing.title)?;
        worksheet.write_number_with_format(r, 1, listing.price, &currency)?;
        worksheet.write_string(r, 2, listing.price_score.as_str())?;
        worksheet.write_string(r, 3, listing.tags.join(", "))?;

        if let Some(year) = listing.model_year {
            worksheet.write_number(r, 4, year)?;
        }
        if let Some(km) = listing.mileage_km {
            worksheet.write_number(r, 5, km as f64)?;
        }
        worksheet.write_number(r, 6, listing.annual_mileage as f64)?;

        worksheet.write_string(r, 7, &listing.city)?;
        worksheet.write_string(r, 8, &listing.region)?;
        worksheet.write_string(r, 9, &listing.url)?;
    }

    worksheet.set_column_width(0, 40)?;
    worksheet.set_column_width(1, 15)?;
    worksheet.set_column_width(3, 30)?;
    worksheet.set_column_width(9, 60)?;

    workbook.save(path)?;
    Ok(())
}
