//! Browser session abstraction.
//!
//! The collector and resolver only talk to a `Browser`; the WebDriver-backed
//! implementation lives in [`webdriver`]. Each phase owns one session and must
//! `close()` it on every exit path.

pub mod webdriver;

#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BrowserError {
    #[error("no element matches {0}")]
    NoSuchElement(String),
    #[error("element went stale: {0}")]
    StaleElement(String),
    #[error("element not interactable: {0}")]
    NotInteractable(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("webdriver error: {0}")]
    Driver(String),
}

impl BrowserError {
    /// Stale or non-interactable elements: the page changed under us.
    pub fn is_interaction_fault(&self) -> bool {
        matches!(self, Self::StaleElement(_) | Self::NotInteractable(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NoSuchElement(_))
    }
}

/// Rendered text and inner HTML of one matched element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementContent {
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Browser: Send {
    /// Load a URL in the current tab.
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;
    /// Current `document.body.scrollHeight`.
    async fn page_height(&mut self) -> Result<i64, BrowserError>;
    /// Scroll to the end of the document to trigger lazy loading.
    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError>;
    /// Wait up to `timeout` for `css` to match, then return every match.
    async fn wait_for_elements(
        &mut self,
        css: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementContent>, BrowserError>;
    /// Choose the option with visible text `label` in the `<select>` at `css`.
    async fn select_by_label(&mut self, css: &str, label: &str) -> Result<(), BrowserError>;
    /// Number of elements matching `css`.
    async fn count(&mut self, css: &str) -> Result<usize, BrowserError>;
    /// Click the `index`-th match of `css` with its `target` attribute removed,
    /// so the link opens in the current tab.
    async fn open_in_place(&mut self, css: &str, index: usize) -> Result<(), BrowserError>;
    /// Text of every element matching `css`.
    async fn texts(&mut self, css: &str) -> Result<Vec<String>, BrowserError>;
    /// Text of every `child` inside the first `container`.
    async fn texts_within(
        &mut self,
        container: &str,
        child: &str,
    ) -> Result<Vec<String>, BrowserError>;
    /// End the session. Safe to call more than once.
    async fn close(&mut self) -> Result<(), BrowserError>;
}
