pub mod vin;

use std::collections::HashSet;
use std::fmt;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::{Browser, BrowserError};
use crate::listing::Listing;
use crate::settings::Settings;
use vin::VinLayout;

/// Why a listing was dropped from the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    QueryFailed,
    SortControlMissing,
    NoCandidates,
    InteractionFault,
    NoVin,
    DriverFault,
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Removal::QueryFailed => "query page failed to load",
            Removal::SortControlMissing => "sort control not found",
            Removal::NoCandidates => "no matching results",
            Removal::InteractionFault => "result link stale or not interactable",
            Removal::NoVin => "no VIN on any result",
            Removal::DriverFault => "webdriver fault",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    VinFound(String),
    Unresolved(Removal),
}

/// Result of a resolver pass: surviving listings (VIN set, input order) and
/// the original index of every dropped one.
#[derive(Debug)]
pub struct ResolveReport {
    pub kept: Vec<Listing>,
    pub removed: Vec<(usize, Removal)>,
}

/// Aggregator search for the same make, model and year, with mileage up to
/// `mileage_window` below the listing's.
pub fn query_url(settings: &Settings, listing: &Listing) -> Result<Url, url::ParseError> {
    let year = listing.year.to_string();
    let min_miles = ((listing.mileage - settings.mileage_window) as i64).to_string();
    let max_miles = (listing.mileage as i64).to_string();

    Url::parse_with_params(
        &settings.aggregator_url,
        &[
            ("make", listing.brand.to_lowercase()),
            ("model", listing.model.to_lowercase()),
            ("zip", settings.zip.clone()),
            ("radius", settings.radius.to_string()),
            ("minyear", year.clone()),
            ("maxyear", year),
            ("minmiles", min_miles),
            ("maxmiles", max_miles),
            ("title", settings.title_status.clone()),
        ],
    )
}

/// Cross-reference every listing in order. A failure on one listing only
/// removes that listing.
pub async fn resolve_all(
    browser: &mut dyn Browser,
    settings: &Settings,
    mut listings: Vec<Listing>,
) -> ResolveReport {
    let layouts = vin::default_layouts(settings);
    let mut removed = Vec::new();

    let pb = ProgressBar::new(listings.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    for (i, listing) in listings.iter_mut().enumerate() {
        match resolve_one(browser, settings, &layouts, listing).await {
            Outcome::VinFound(vin) => listing.vin = Some(vin),
            Outcome::Unresolved(reason) => {
                warn!("Removing {} ({}): {}", listing.title(), listing.link, reason);
                removed.push((i, reason));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let indices: Vec<usize> = removed.iter().map(|(i, _)| *i).collect();
    info!("Indices to remove: {:?}", indices);
    info!("Listings before removal: {}", listings.len());
    let kept = retain_unmarked(listings, &indices);
    info!("Listings after removal: {}", kept.len());

    ResolveReport { kept, removed }
}

/// Resolve a single listing; any browser fault becomes a removal.
pub async fn resolve_one(
    browser: &mut dyn Browser,
    settings: &Settings,
    layouts: &[Box<dyn VinLayout>],
    listing: &Listing,
) -> Outcome {
    match try_resolve(browser, settings, layouts, listing).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("WebDriver fault while resolving {}: {}", listing.title(), e);
            Outcome::Unresolved(Removal::DriverFault)
        }
    }
}

async fn try_resolve(
    browser: &mut dyn Browser,
    settings: &Settings,
    layouts: &[Box<dyn VinLayout>],
    listing: &Listing,
) -> Result<Outcome, BrowserError> {
    info!("Searching aggregator for {}", listing.title());

    let url = match query_url(settings, listing) {
        Ok(url) => url,
        Err(e) => {
            error!("Cannot build query for {}: {}", listing.title(), e);
            return Ok(Outcome::Unresolved(Removal::QueryFailed));
        }
    };
    if let Some(reason) = open_sorted_results(browser, settings, listing, &url).await? {
        return Ok(Outcome::Unresolved(reason));
    }

    let total = browser.count(&settings.candidate_selector).await?;
    if total == 0 {
        info!("No results for {}", listing.title());
        return Ok(Outcome::Unresolved(Removal::NoCandidates));
    }

    for index in 0..total {
        // Links on the result list go stale once we leave it, and a reload
        // restores the default order, so each later candidate is picked from
        // a freshly loaded and sorted list.
        if index > 0 {
            if let Some(reason) = open_sorted_results(browser, settings, listing, &url).await? {
                return Ok(Outcome::Unresolved(reason));
            }
        }

        match browser.open_in_place(&settings.candidate_selector, index).await {
            Ok(()) => {}
            Err(e) if e.is_interaction_fault() => {
                error!("Result link unusable for {}: {}", listing.title(), e);
                return Ok(Outcome::Unresolved(Removal::InteractionFault));
            }
            Err(e) if e.is_missing() => {
                debug!("Result list shrank to {} entries", index);
                break;
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(settings.render_pause()).await;

        match vin::extract(browser, layouts).await {
            Ok(Some(vin)) => {
                info!("VIN found: {}", vin);
                return Ok(Outcome::VinFound(vin));
            }
            Ok(None) => info!("VIN not found on result {}/{}", index + 1, total),
            Err(e) if e.is_interaction_fault() => {
                error!("Detail page changed while reading VIN: {}", e);
                return Ok(Outcome::Unresolved(Removal::InteractionFault));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Outcome::Unresolved(Removal::NoVin))
}

/// Load the query page and sort it by ascending price. `Ok(Some(_))` names
/// the removal when the page or its sort control is unusable.
async fn open_sorted_results(
    browser: &mut dyn Browser,
    settings: &Settings,
    listing: &Listing,
    url: &Url,
) -> Result<Option<Removal>, BrowserError> {
    if let Err(e) = browser.goto(url.as_str()).await {
        error!("Query page failed for {}: {}", listing.title(), e);
        return Ok(Some(Removal::QueryFailed));
    }

    match browser
        .select_by_label(&settings.sort_selector, &settings.sort_label)
        .await
    {
        Ok(()) => {}
        Err(e) if e.is_missing() => {
            error!("Sort control not found for {}", listing.title());
            return Ok(Some(Removal::SortControlMissing));
        }
        Err(e) => return Err(e),
    }
    tokio::time::sleep(settings.render_pause()).await;
    Ok(None)
}

/// Drop the items at the marked positions (duplicates allowed), keeping the
/// order of the rest.
pub fn retain_unmarked<T>(items: Vec<T>, marks: &[usize]) -> Vec<T> {
    let marked: HashSet<usize> = marks.iter().copied().collect();
    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !marked.contains(i))
        .map(|(_, item)| item)
        .collect()
}

// ── Tests ──
