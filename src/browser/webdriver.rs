use std::time::{Duration, Instant};

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{Browser, BrowserError, ElementContent};
use crate::settings::Settings;

const REMOVE_TARGET_JS: &str = "arguments[0].removeAttribute('target');";
const SCROLL_HEIGHT_JS: &str = "return document.body.scrollHeight;";
const SCROLL_END_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// A Chrome session driven over the WebDriver protocol.
pub struct WebDriverSession {
    client: Option<Client>,
}

impl WebDriverSession {
    pub async fn connect(settings: &Settings) -> Result<Self, BrowserError> {
        info!("Connecting to WebDriver at {}", settings.webdriver_url);

        let mut args = vec!["--window-size=1920,1080", "--disable-gpu"];
        if settings.headless {
            args.push("--headless=new");
        }
        let mut caps = serde_json::Map::new();
        caps.insert("browserName".into(), json!("chrome"));
        caps.insert("goog:chromeOptions".into(), json!({ "args": args }));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .map_err(|e| BrowserError::Driver(format!("failed to start session: {e}")))?;

        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&Client, BrowserError> {
        self.client
            .as_ref()
            .ok_or_else(|| BrowserError::Driver("session already closed".into()))
    }

    async fn nth(&self, css: &str, index: usize) -> Result<Element, BrowserError> {
        let mut found = self
            .client()?
            .find_all(Locator::Css(css))
            .await
            .map_err(classify)?;
        if index >= found.len() {
            return Err(BrowserError::NoSuchElement(format!("{css}[{index}]")));
        }
        Ok(found.swap_remove(index))
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        let start = Instant::now();
        self.client()?
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
        debug!("Opened {} in {:.2}s", url, start.elapsed().as_secs_f64());
        Ok(())
    }

    async fn page_height(&mut self) -> Result<i64, BrowserError> {
        let value = self
            .client()?
            .execute(SCROLL_HEIGHT_JS, Vec::new())
            .await
            .map_err(classify)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|h| h as i64))
            .ok_or_else(|| BrowserError::Driver(format!("unexpected scrollHeight {value}")))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.client()?
            .execute(SCROLL_END_JS, Vec::new())
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn wait_for_elements(
        &mut self,
        css: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementContent>, BrowserError> {
        let client = self.client()?;
        client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(css))
            .await
            .map_err(classify)?;

        let elements = client.find_all(Locator::Css(css)).await.map_err(classify)?;
        let mut contents = Vec::with_capacity(elements.len());
        for element in elements {
            contents.push(ElementContent {
                text: element.text().await.map_err(classify)?,
                html: element.html(true).await.map_err(classify)?,
            });
        }
        Ok(contents)
    }

    async fn select_by_label(&mut self, css: &str, label: &str) -> Result<(), BrowserError> {
        let select = self
            .client()?
            .find(Locator::Css(css))
            .await
            .map_err(classify)?;
        select.select_by_label(label).await.map_err(classify)
    }

    async fn count(&mut self, css: &str) -> Result<usize, BrowserError> {
        let found = self
            .client()?
            .find_all(Locator::Css(css))
            .await
            .map_err(classify)?;
        Ok(found.len())
    }

    async fn open_in_place(&mut self, css: &str, index: usize) -> Result<(), BrowserError> {
        let link = self.nth(css, index).await?;
        let arg = serde_json::to_value(&link).map_err(|e| BrowserError::Driver(e.to_string()))?;
        self.client()?
            .execute(REMOVE_TARGET_JS, vec![arg])
            .await
            .map_err(classify)?;
        link.click().await.map_err(classify)
    }

    async fn texts(&mut self, css: &str) -> Result<Vec<String>, BrowserError> {
        let elements = self
            .client()?
            .find_all(Locator::Css(css))
            .await
            .map_err(classify)?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            texts.push(element.text().await.map_err(classify)?);
        }
        Ok(texts)
    }

    async fn texts_within(
        &mut self,
        container: &str,
        child: &str,
    ) -> Result<Vec<String>, BrowserError> {
        let parent = self
            .client()?
            .find(Locator::Css(container))
            .await
            .map_err(classify)?;
        let elements = parent.find_all(Locator::Css(child)).await.map_err(classify)?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            texts.push(element.text().await.map_err(classify)?);
        }
        Ok(texts)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if let Some(client) = self.client.take() {
            info!("Closing WebDriver session");
            if let Err(e) = client.close().await {
                warn!("WebDriver session did not close cleanly: {}", e);
                return Err(BrowserError::Driver(e.to_string()));
            }
        }
        Ok(())
    }
}

fn classify(e: CmdError) -> BrowserError {
    match &e {
        CmdError::WaitTimeout => BrowserError::Timeout(e.to_string()),
        CmdError::Standard(wd) => match wd.error {
            ErrorStatus::StaleElementReference => BrowserError::StaleElement(e.to_string()),
            ErrorStatus::ElementNotInteractable | ErrorStatus::ElementClickIntercepted => {
                BrowserError::NotInteractable(e.to_string())
            }
            ErrorStatus::NoSuchElement => BrowserError::NoSuchElement(e.to_string()),
            ErrorStatus::Timeout => BrowserError::Timeout(e.to_string()),
            _ => BrowserError::Driver(e.to_string()),
        },
        _ => BrowserError::Driver(e.to_string()),
    }
}
