mod browser;
mod collector;
mod listing;
mod parser;
mod resolver;
mod settings;
mod table;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use browser::webdriver::WebDriverSession;
use browser::Browser;
use listing::Listing;
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "marketplace_vin",
    about = "Collect marketplace vehicle listings and recover their VINs from an aggregator"
)]
struct Cli {
    /// Marketplace search URL (default: the configured vehicle query)
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    let url = cli.url.unwrap_or_else(|| settings.marketplace_url.clone());

    // Phase 1: collect + parse
    info!("Starting marketplace scraper with URL: {}", url);
    let listings = collect_listings(&settings, &url).await?;
    println!("Parsed {} listings", listings.len());

    // Phase 2: cross-reference
    let resolved = if listings.is_empty() {
        Vec::new()
    } else {
        println!("Cross-referencing {} listings...", listings.len());
        let t_resolve = Instant::now();
        let report = resolve_listings(&settings, listings).await?;
        println!(
            "Resolved {} listings ({} removed) in {}",
            report.kept.len(),
            report.removed.len(),
            format_duration(t_resolve.elapsed())
        );
        report.kept
    };

    // Phase 3: write
    let rows = table::assemble(resolved);
    table::write_file(&settings.output_path, &rows)?;
    for row in &rows {
        info!(
            "{} | {} | {} | {} | {}",
            row.price,
            row.title(),
            row.location,
            row.link,
            row.vin.as_deref().unwrap_or("-")
        );
    }
    println!("Wrote {} rows to {}", rows.len(), settings.output_path);

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

async fn collect_listings(settings: &Settings, url: &str) -> Result<Vec<Listing>> {
    let mut session = WebDriverSession::connect(settings)
        .await
        .context("Failed to open marketplace session")?;
    Ok(run_collection(&mut session, settings, url).await)
}

async fn resolve_listings(
    settings: &Settings,
    listings: Vec<Listing>,
) -> Result<resolver::ResolveReport> {
    let mut session = WebDriverSession::connect(settings)
        .await
        .context("Failed to open aggregator session")?;
    Ok(run_resolution(&mut session, settings, listings).await)
}

/// Collect and parse in `browser`, then close it. A discovery failure yields
/// no listings rather than an error; the session is closed either way.
async fn run_collection(
    browser: &mut dyn Browser,
    settings: &Settings,
    url: &str,
) -> Vec<Listing> {
    let collected = collector::collect(browser, settings, url).await;
    if let Err(e) = browser.close().await {
        error!("Failed to close marketplace session: {}", e);
    }

    match collected {
        Ok(candidates) => parser::parse_candidates(&candidates),
        Err(e) => {
            error!("Discovery failed: {}", e);
            Vec::new()
        }
    }
}

async fn run_resolution(
    browser: &mut dyn Browser,
    settings: &Settings,
    listings: Vec<Listing>,
) -> resolver::ResolveReport {
    let report = resolver::resolve_all(browser, settings, listings).await;
    if let Err(e) = browser.close().await {
        error!("Failed to close aggregator session: {}", e);
    }
    report
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
