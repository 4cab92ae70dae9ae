use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const ENV_PREFIX: &str = "MARKETPLACE_VIN";

pub const DEFAULT_MARKETPLACE_URL: &str = "https://www.facebook.com/marketplace/la/vehicles?minPrice=3000&maxMileage=70000&minYear=2016&topLevelVehicleType=car_truck&exact=false";

/// Run settings. The defaults are the run's behavior and describe the two
/// known sites. `MARKETPLACE_VIN_<FIELD>` variables (e.g.
/// `MARKETPLACE_VIN_HEADLESS=false`) are an operator override only; with none
/// set, every value is the default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub webdriver_url: String,
    pub headless: bool,
    pub output_path: String,

    // Marketplace
    pub marketplace_url: String,
    pub marketplace_origin: String,
    pub card_selector: String,
    pub scroll_pause_ms: u64,
    pub max_idle_scrolls: u32,
    pub card_wait_secs: u64,

    // Aggregator
    pub aggregator_url: String,
    pub zip: String,
    pub radius: u32,
    pub title_status: String,
    pub mileage_window: f64,
    pub sort_selector: String,
    pub sort_label: String,
    pub candidate_selector: String,
    pub render_pause_ms: u64,
    pub definitions_selector: String,
    pub flex_selector: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".into(),
            headless: true,
            output_path: "processed_titles.csv".into(),

            marketplace_url: DEFAULT_MARKETPLACE_URL.into(),
            marketplace_origin: "https://www.facebook.com".into(),
            card_selector: "div[class='x3ct3a4']".into(),
            scroll_pause_ms: 1000,
            max_idle_scrolls: 5,
            card_wait_secs: 10,

            aggregator_url: "https://www.autotempest.com/results".into(),
            zip: "94579".into(),
            radius: 500,
            title_status: "clean".into(),
            mileage_window: 5000.0,
            sort_selector: "#sort-secondary".into(),
            sort_label: "Lowest Price".into(),
            candidate_selector: "li.result-list-item a.listing-link".into(),
            render_pause_ms: 3000,
            definitions_selector: ".basics-content-wrapper".into(),
            flex_selector: "div.flex.items-center".into(),
        }
    }
}

impl Settings {
    /// Defaults overlaid with `MARKETPLACE_VIN_*` environment variables.
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .context("Invalid MARKETPLACE_VIN_* settings")
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn card_wait(&self) -> Duration {
        Duration::from_secs(self.card_wait_secs)
    }

    pub fn render_pause(&self) -> Duration {
        Duration::from_millis(self.render_pause_ms)
    }

    /// Defaults with every pause zeroed.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            scroll_pause_ms: 0,
            render_pause_ms: 0,
            card_wait_secs: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_known_sites() {
        let s = Settings::default();
        assert_eq!(s.max_idle_scrolls, 5);
        assert_eq!(s.card_wait(), Duration::from_secs(10));
        assert_eq!(s.render_pause(), Duration::from_secs(3));
        assert_eq!(s.sort_label, "Lowest Price");
        assert_eq!(s.output_path, "processed_titles.csv");
    }

    #[test]
    fn load_without_env_is_default() {
        let s = Settings::load().unwrap();
        assert_eq!(s.zip, Settings::default().zip);
        assert_eq!(s.marketplace_url, DEFAULT_MARKETPLACE_URL);
    }
}
