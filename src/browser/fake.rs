//! Scripted in-memory browser for tests. Pages are keyed by URL; anything not
//! registered fails to load.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::{Browser, BrowserError, ElementContent};

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    /// Successive `scrollHeight` readings; the last one repeats.
    pub heights: Vec<i64>,
    pub cards: Vec<ElementContent>,
    pub sort_control: bool,
    /// URLs the result links lead to, in displayed order.
    pub candidates: Vec<String>,
    /// `dt` and `dd` texts of the definitions block, if the page has one.
    pub definitions: Option<(Vec<String>, Vec<String>)>,
    pub flex: Vec<String>,
    /// Clicking any result link fails with a stale element.
    pub stale_links: bool,
}

impl FakePage {
    pub fn results(candidates: &[&str]) -> Self {
        Self {
            sort_control: true,
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn definitions(pairs: &[(&str, &str)]) -> Self {
        Self {
            definitions: Some((
                pairs.iter().map(|(t, _)| t.to_string()).collect(),
                pairs.iter().map(|(_, d)| d.to_string()).collect(),
            )),
            ..Default::default()
        }
    }

    pub fn flex(texts: &[&str]) -> Self {
        Self {
            flex: texts.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeBrowser {
    pages: HashMap<String, FakePage>,
    history: Vec<String>,
    height_reads: usize,
    /// Page URL -> number of sorts it accepts before its control disappears.
    sort_limits: HashMap<String, usize>,
    sort_uses: HashMap<String, usize>,
    pub visited: Vec<String>,
    pub scrolls: usize,
    pub selections: Vec<String>,
    pub closed: bool,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, page: FakePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    pub fn drop_sort_control_after(&mut self, url: &str, sorts: usize) {
        self.sort_limits.insert(url.to_string(), sorts);
    }

    fn current(&self) -> Result<&FakePage, BrowserError> {
        let url = self
            .history
            .last()
            .ok_or_else(|| BrowserError::Driver("no page loaded".into()))?;
        self.pages
            .get(url)
            .ok_or_else(|| BrowserError::Navigation(url.clone()))
    }

    fn load(&mut self, url: &str) -> Result<(), BrowserError> {
        if self.closed {
            return Err(BrowserError::Driver("session already closed".into()));
        }
        if !self.pages.contains_key(url) {
            return Err(BrowserError::Navigation(format!("{url}: unreachable")));
        }
        self.visited.push(url.to_string());
        self.history.push(url.to_string());
        self.height_reads = 0;
        Ok(())
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.load(url)
    }

    async fn page_height(&mut self) -> Result<i64, BrowserError> {
        let heights = &self.current()?.heights;
        let height = heights
            .get(self.height_reads)
            .or(heights.last())
            .copied()
            .unwrap_or(0);
        self.height_reads += 1;
        Ok(height)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.current()?;
        self.scrolls += 1;
        Ok(())
    }

    async fn wait_for_elements(
        &mut self,
        css: &str,
        _timeout: Duration,
    ) -> Result<Vec<ElementContent>, BrowserError> {
        let cards = &self.current()?.cards;
        if cards.is_empty() {
            return Err(BrowserError::Timeout(css.to_string()));
        }
        Ok(cards.clone())
    }

    async fn select_by_label(&mut self, css: &str, label: &str) -> Result<(), BrowserError> {
        let missing = BrowserError::NoSuchElement(css.to_string());
        if !self.current()?.sort_control {
            return Err(missing);
        }
        if let Some(url) = self.history.last() {
            let uses = self.sort_uses.entry(url.clone()).or_default();
            if self.sort_limits.get(url).is_some_and(|limit| *uses >= *limit) {
                return Err(missing);
            }
            *uses += 1;
        }
        self.selections.push(label.to_string());
        Ok(())
    }

    async fn count(&mut self, _css: &str) -> Result<usize, BrowserError> {
        Ok(self.current()?.candidates.len())
    }

    async fn open_in_place(&mut self, css: &str, index: usize) -> Result<(), BrowserError> {
        let page = self.current()?;
        if page.stale_links {
            return Err(BrowserError::StaleElement(css.to_string()));
        }
        let target = page
            .candidates
            .get(index)
            .cloned()
            .ok_or_else(|| BrowserError::NoSuchElement(format!("{css}[{index}]")))?;
        self.load(&target)
    }

    async fn texts(&mut self, _css: &str) -> Result<Vec<String>, BrowserError> {
        Ok(self.current()?.flex.clone())
    }

    async fn texts_within(
        &mut self,
        container: &str,
        child: &str,
    ) -> Result<Vec<String>, BrowserError> {
        let (terms, defs) = self
            .current()?
            .definitions
            .clone()
            .ok_or_else(|| BrowserError::NoSuchElement(container.to_string()))?;
        Ok(if child == "dt" { terms } else { defs })
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.closed = true;
        Ok(())
    }
}
