use crate::config::{Config, MAX_PAGES};
use crate::domain::analysis::is_alert;
use crate::errors::{InputError, PipelineError};
use crate::net::ReqwestTransport;
use crate::pipeline::{parse_year, Pipeline, PipelineEvent, Progress, RunReport, SearchRequest};
use crate::spreadsheets::{default_export_path, export_listings_xlsx};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod domain;
mod errors;
mod fipe;
mod net;
mod pipeline;
mod scraper;
mod spreadsheets;

#[cfg(test)]
mod tests;

/// Finds used-car listings and rates each one against its FIPE reference price.
#[derive(Debug, Parser)]
#[command(name = "motor_scout", version)]
struct Cli {
    /// Brand and model, e.g. "Honda Civic"
    #[arg(required = true)]
    model: Vec<String>,

    /// Engine filter added to the listing search ("1.0", "Turbo", "Diesel"...)
    #[arg(long)]
    engine: Option<String>,

    /// City added to the listing search
    #[arg(long)]
    city: Option<String>,

    /// Two-letter state code (BR = nationwide)
    #[arg(long, default_value = "BR")]
    region: String,

    /// First model-year; also the year priced against the catalog
    #[arg(long, default_value = "")]
    year_min: String,

    #[arg(long, default_value = "")]
    year_max: String,

    #[arg(long)]
    price_min: Option<u32>,

    #[arg(long)]
    price_max: Option<u32>,

    /// Result pages to walk
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=MAX_PAGES as i64))]
    pages: u32,

    /// Save the ranked listings to a spreadsheet instead of printing them
    #[arg(long)]
    xlsx: bool,

    #[arg(long, default_value = "data", env = "MOTOR_SCOUT_OUT_DIR")]
    out_dir: PathBuf,

    /// Print the full report as JSON
    #[arg(long, conflicts_with = "xlsx")]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("motor_scout=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1️⃣ Validate input before touching the network
    let request = match build_request(&cli) {
        Ok(req) => req,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::from(2);
        }
    };

    // 2️⃣ Wire up transport + pipeline
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::from(2);
        }
    };
    let transport = match ReqwestTransport::new(&config.user_agent, config.request_timeout) {
        Ok(t) => Arc::new(t),
        Err(e) => {
            eprintln!("❌ HTTP client init failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    let pipeline = Arc::new(Pipeline::from_config(&config, transport));

    // 3️⃣ Run off the main thread, reporting progress as it comes in
    let mut outcome = None;
    for event in pipeline.run_in_background(request.clone()).iter() {
        match event {
            PipelineEvent::Progress(p) => report_progress(&p),
            PipelineEvent::Finished(result) => outcome = Some(result),
        }
    }

    let report = match outcome {
        Some(Ok(report)) => report,
        Some(Err(e)) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
        None => {
            eprintln!("❌ search worker exited without a result");
            return ExitCode::FAILURE;
        }
    };

    // 4️⃣ Hand the ranked listings to the chosen output
    if cli.xlsx {
        let path = default_export_path(
            &cli.out_dir,
            &cli.region,
            &request.model,
            chrono::Local::now().naive_local(),
        );
        if let Err(e) = export_listings_xlsx(&report.listings, &path).map_err(PipelineError::from) {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
        println!("✅ Analysis saved to {}", path.display());
    } else if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("❌ {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&report);
    }

    ExitCode::SUCCESS
}

fn build_request(cli: &Cli) -> Result<SearchRequest, InputError> {
    let request = SearchRequest {
        engine: cli.engine.clone(),
        city: cli.city.clone(),
        year_min: parse_year(&cli.year_min)?,
        year_max: parse_year(&cli.year_max)?,
        price_min: cli.price_min,
        price_max: cli.price_max,
        region: Some(cli.region.clone()),
        ..SearchRequest::new(cli.model.join(" "), cli.pages)
    };
    request.validate()?;
    Ok(request)
}

fn report_progress(progress: &Progress) {
    match progress {
        Progress::ReferenceLookupStarted { query, year } => {
            eprintln!("📊 Looking up FIPE for {query} ({year})...")
        }
        Progress::ReferenceLookupDone(reference) if reference.is_found() => eprintln!(
            "📊 FIPE reference: R$ {:.1}k ({})",
            reference.average / 1000.0,
            reference.message
        ),
        Progress::ReferenceLookupDone(reference) => {
            eprintln!("📊 FIPE not found: {}", reference.message)
        }
        Progress::ListingSearchStarted { term } => eprintln!("🔎 Searching listings for '{term}'..."),
        Progress::Done { count } => eprintln!("✅ {count} vehicles analysed."),
    }
}

fn print_report(report: &RunReport) {
    for listing in &report.listings {
        let year = listing
            .model_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        let km = listing
            .mileage_km
            .map(|km| format!("{km} km"))
            .unwrap_or_else(|| "- km".to_string());
        let per_year = if listing.annual_mileage > 0 {
            format!(" (~{}/year)", listing.annual_mileage)
        } else {
            String::new()
        };

        println!(
            "[{:<9}] R$ {:>10.0}  {}",
            listing.price_score, listing.price, listing.title
        );
        println!(
            "            {year} • {km}{per_year} • {} • {}-{}",
            listing.transmission, listing.city, listing.region
        );
        if !listing.tags.is_empty() {
            let tags: Vec<String> = listing
                .tags
                .iter()
                .map(|t| if is_alert(t) { format!("⚠️ {t}") } else { t.clone() })
                .collect();
            println!("            {}", tags.join(" | "));
        }
        if !listing.url.is_empty() {
            println!("            {}", listing.url);
        }
        println!();
    }
}
