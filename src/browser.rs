use std::time::Duration;
use thirtyfour::prelude::*;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::error::{Result, SpyError, Stage};
use crate::recon::Page;

// Expand buttons on vacancy pages that hide part of the description.
const SHOW_MORE_SELECTORS: [&str; 5] = [
    "button.show-more-less-html__button",
    "button.show-more-less-html__button--more",
    ".jobs-description__footer-button",
    "button[aria-label*='Show more']",
    "button[aria-label*='Meer']",
];

const DESCRIPTION_SELECTORS: [&str; 8] = [
    ".jobs-description__content",
    ".show-more-less-html__markup",
    ".description__text",
    "#job-details",
    "[class*='vacancy']",
    "[class*='job-description']",
    "article",
    "main",
];

// Renders pages through a WebDriver session, for vacancy sites that
// build their content with JavaScript.
pub struct BrowserFetcher {
    webdriver_url: String,
    timeout: Duration,
}

fn driver_error(err: WebDriverError) -> SpyError {
    SpyError::acquisition(Stage::Reconnaissance, format!("Browser error: {}", err))
}

impl BrowserFetcher {
    pub fn new(webdriver_url: &str, timeout: Duration) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            timeout,
        }
    }

    // Opens a headless Chrome session, reads the page and closes the session.
    // Starting the session and reading the page share one deadline.
    pub async fn fetch(&self, url: &str) -> Result<Page> {
        info!(url, "fetching page in browser");
        let deadline = Instant::now() + self.timeout;

        let mut caps = DesiredCapabilities::chrome();
        caps.set_headless().map_err(driver_error)?;
        let session = timeout_at(deadline, WebDriver::new(&self.webdriver_url, caps))
            .await
            .map_err(|_| self.timed_out(url))?;
        let driver = session.map_err(|e| {
            SpyError::acquisition(
                Stage::Reconnaissance,
                format!(
                    "Failed to start browser session at {}. Is chromedriver running? ({})",
                    self.webdriver_url, e
                ),
            )
        })?;

        let outcome = timeout_at(deadline, read_page(&driver, url)).await;

        if let Err(e) = driver.quit().await {
            warn!("failed to close browser session: {}", e);
        }

        outcome.map_err(|_| self.timed_out(url))?
    }

    fn timed_out(&self, url: &str) -> SpyError {
        SpyError::acquisition(
            Stage::Reconnaissance,
            format!("Browser timed out after {}s loading {}", self.timeout.as_secs(), url),
        )
    }
}

async fn read_page(driver: &WebDriver, url: &str) -> Result<Page> {
    driver.goto(url).await.map_err(driver_error)?;

    for selector in SHOW_MORE_SELECTORS {
        if let Ok(button) = driver.find(By::Css(selector)).await {
            if button.click().await.is_ok() {
                debug!(selector, "expanded description");
                tokio::time::sleep(Duration::from_secs(2)).await;
                break;
            }
        }
    }

    let title = driver.title().await.unwrap_or_default();

    for selector in DESCRIPTION_SELECTORS {
        if let Ok(element) = driver.find(By::Css(selector)).await {
            if let Ok(text) = element.text().await {
                if !text.trim().is_empty() {
                    debug!(selector, chars = text.len(), "extracted description");
                    return Ok(Page { title, text });
                }
            }
        }
    }

    debug!("no description container found, using body text");
    let body = driver.find(By::Tag("body")).await.map_err(driver_error)?;
    let text = body.text().await.map_err(driver_error)?;

    if text.trim().is_empty() {
        return Err(SpyError::acquisition(
            Stage::Reconnaissance,
            format!("No content found on {}", url),
        ));
    }

    Ok(Page { title, text })
}
