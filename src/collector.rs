use std::time::Instant;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::browser::{Browser, BrowserError};
use crate::listing::RawCandidate;
use crate::parser::link;
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no listing containers matched {0}")]
    NoContainers(String),
    #[error("failed to load listing containers: {0}")]
    Browser(#[from] BrowserError),
}

/// Load the marketplace page, scroll until it stops growing and read every card.
pub async fn collect(
    browser: &mut dyn Browser,
    settings: &Settings,
    url: &str,
) -> Result<Vec<RawCandidate>, DiscoveryError> {
    let start = Instant::now();
    browser.goto(url).await?;
    info!("URL opened in {:.2} seconds", start.elapsed().as_secs_f64());

    scroll_until_idle(browser, settings).await?;

    let cards = match browser
        .wait_for_elements(&settings.card_selector, settings.card_wait())
        .await
    {
        Ok(cards) if !cards.is_empty() => cards,
        Ok(_) => {
            error!("No containers found. Check the card selector.");
            return Err(DiscoveryError::NoContainers(settings.card_selector.clone()));
        }
        Err(e) => {
            error!("Failed to find containers: {}", e);
            return Err(e.into());
        }
    };
    info!("Found {} listing cards", cards.len());

    let mut candidates = Vec::with_capacity(cards.len());
    for card in cards {
        match link::from_card_html(&card.html, &settings.marketplace_origin) {
            Some(link) => candidates.push(RawCandidate::new(card.text, link)),
            None => warn!("Card without a link, skipping: {:?}", card.text),
        }
    }
    Ok(candidates)
}

/// Keep scrolling until the page height stays put for `max_idle_scrolls`
/// consecutive attempts.
async fn scroll_until_idle(
    browser: &mut dyn Browser,
    settings: &Settings,
) -> Result<(), BrowserError> {
    let mut height = browser.page_height().await?;
    let mut idle = 0;

    while idle < settings.max_idle_scrolls {
        browser.scroll_to_bottom().await?;
        tokio::time::sleep(settings.scroll_pause()).await;
        let new_height = browser.page_height().await?;
        if new_height == height {
            idle += 1;
        } else {
            debug!("Page grew {} -> {}", height, new_height);
            height = new_height;
            idle = 0;
        }
    }
    Ok(())
}
