//! VIN lookup on an aggregator detail page.
//!
//! Detail pages come in more than one layout. Each layout is a [`VinLayout`];
//! they are tried in order and the first valid VIN wins.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::browser::{Browser, BrowserError};
use crate::settings::Settings;

/// 17 characters, uppercase alphanumerics without I, O and Q.
static VIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap());

const VIN_TERM: &str = "VIN";
const VIN_LABEL: &str = "VIN:";

pub fn is_valid(candidate: &str) -> bool {
    VIN_RE.is_match(candidate)
}

#[async_trait]
pub trait VinLayout: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this layout is absent or holds no valid VIN.
    async fn find(&self, page: &mut dyn Browser) -> Result<Option<String>, BrowserError>;
}

/// `<dl>`-style block where a `dt` reading exactly `VIN` is paired
/// positionally with its `dd`.
pub struct DefinitionList {
    pub container: String,
}

#[async_trait]
impl VinLayout for DefinitionList {
    fn name(&self) -> &'static str {
        "definition-list"
    }

    async fn find(&self, page: &mut dyn Browser) -> Result<Option<String>, BrowserError> {
        let terms = match page.texts_within(&self.container, "dt").await {
            Ok(terms) => terms,
            Err(e) if e.is_missing() => return Ok(None),
            Err(e) => return Err(e),
        };
        let definitions = page.texts_within(&self.container, "dd").await?;
        Ok(from_definitions(&terms, &definitions))
    }
}

/// Flex rows whose text reads `VIN: <value>`.
pub struct LabeledRow {
    pub selector: String,
}

#[async_trait]
impl VinLayout for LabeledRow {
    fn name(&self) -> &'static str {
        "labeled-row"
    }

    async fn find(&self, page: &mut dyn Browser) -> Result<Option<String>, BrowserError> {
        match page.texts(&self.selector).await {
            Ok(rows) => Ok(from_labeled_rows(&rows)),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// The known detail-page layouts, in the order they are tried.
pub fn default_layouts(settings: &Settings) -> Vec<Box<dyn VinLayout>> {
    vec![
        Box::new(DefinitionList {
            container: settings.definitions_selector.clone(),
        }),
        Box::new(LabeledRow {
            selector: settings.flex_selector.clone(),
        }),
    ]
}

/// Try each layout against the current page.
pub async fn extract(
    page: &mut dyn Browser,
    layouts: &[Box<dyn VinLayout>],
) -> Result<Option<String>, BrowserError> {
    for layout in layouts {
        if let Some(vin) = layout.find(page).await? {
            debug!("VIN found via {} layout", layout.name());
            return Ok(Some(vin));
        }
    }
    Ok(None)
}

fn from_definitions(terms: &[String], definitions: &[String]) -> Option<String> {
    terms
        .iter()
        .zip(definitions)
        .filter(|(term, _)| term.as_str() == VIN_TERM)
        .map(|(_, def)| def.trim())
        .find(|vin| is_valid(vin))
        .map(str::to_string)
}

fn from_labeled_rows(rows: &[String]) -> Option<String> {
    rows.iter()
        .filter_map(|row| row.split(VIN_LABEL).nth(1))
        .map(str::trim)
        .find(|vin| is_valid(vin))
        .map(str::to_string)
}
