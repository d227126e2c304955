//! WebDriver-backed [`PageDriver`].
//!
//! Wraps a thirtyfour session with a private tokio runtime so the rest of the
//! crate can stay synchronous: every call blocks until the browser answers.
//!
//! Saved storage state cannot be injected before a page of the right host is
//! open (WebDriver only accepts cookies for the current domain), so it is held
//! back and replayed after the first navigation to each matching host.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thirtyfour::ChromiumLikeCapabilities;
use thirtyfour::prelude::*;
use thirtyfour::{Cookie, error::WebDriverError};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::{
    ACTIONABLE_ELEMENTS_QUERY, BrowserError, BrowserResult, ElementHandle, Locator, OriginStorage,
    PageDriver, StorageEntry, StorageState, cookie_from_webdriver, cookie_to_webdriver,
};
use crate::config::{BrowserKind, BrowserSettings};

/// Interval between visibility polls
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const READ_LOCAL_STORAGE: &str = "return Object.keys(window.localStorage).map(k => ({ name: k, value: window.localStorage.getItem(k) }));";

const WRITE_LOCAL_STORAGE: &str = "for (const e of arguments[0]) { window.localStorage.setItem(e.name, e.value); }";

/// Pages that mean "nothing loaded yet"
const BLANK_URLS: [&str; 2] = ["about:blank", "data:,"];

fn driver_error(e: WebDriverError) -> BrowserError {
    BrowserError::Driver(e.to_string())
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::Css(css) => By::Css(css.as_str()),
        Locator::XPath(xpath) => By::XPath(xpath.as_str()),
    }
}

/// One element handle plus the runtime needed to query it
pub struct WebDriverElement {
    element: WebElement,
    runtime: Arc<Runtime>,
}

impl ElementHandle for WebDriverElement {
    fn tag_name(&self) -> BrowserResult<String> {
        self.runtime
            .block_on(self.element.tag_name())
            .map_err(driver_error)
    }

    fn inner_text(&self) -> BrowserResult<String> {
        self.runtime
            .block_on(self.element.text())
            .map_err(driver_error)
    }

    fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
        self.runtime
            .block_on(self.element.attr(name))
            .map_err(driver_error)
    }

    fn sibling_index(&self) -> BrowserResult<usize> {
        let preceding = self
            .runtime
            .block_on(self.element.find_all(By::XPath("preceding-sibling::*")))
            .map_err(driver_error)?;
        Ok(preceding.len() + 1)
    }

    fn is_visible(&self) -> BrowserResult<bool> {
        self.runtime
            .block_on(self.element.is_displayed())
            .map_err(driver_error)
    }
}

/// A live browser tab driven over WebDriver
pub struct WebDriverPage {
    driver: WebDriver,
    runtime: Arc<Runtime>,
    pending_state: Option<StorageState>,
    restored_hosts: HashSet<String>,
}

impl WebDriverPage {
    /// Start a browser session on the configured WebDriver server
    pub fn connect(settings: &BrowserSettings) -> BrowserResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        info!(
            "Connecting to {} WebDriver at {} (headless={})",
            settings.browser, settings.webdriver_url, settings.headless
        );
        let driver = runtime
            .block_on(async {
                match settings.browser {
                    BrowserKind::Chrome => {
                        let mut caps = DesiredCapabilities::chrome();
                        if settings.headless {
                            caps.set_headless()?;
                        }
                        WebDriver::new(settings.webdriver_url.as_str(), caps).await
                    }
                    BrowserKind::Firefox => {
                        let mut caps = DesiredCapabilities::firefox();
                        if settings.headless {
                            caps.set_headless()?;
                        }
                        WebDriver::new(settings.webdriver_url.as_str(), caps).await
                    }
                }
            })
            .map_err(driver_error)?;

        Ok(Self {
            driver,
            runtime: Arc::new(runtime),
            pending_state: None,
            restored_hosts: HashSet::new(),
        })
    }

    fn find(&self, locator: &Locator) -> BrowserResult<WebElement> {
        self.runtime
            .block_on(self.driver.find(to_by(locator)))
            .map_err(|e| {
                debug!("find {} failed: {}", locator, e);
                BrowserError::NotFound(locator.as_str().to_string())
            })
    }

    fn wait(&self, locator: &Locator, timeout: Duration, displayed: bool) -> BrowserResult<()> {
        let result = self.runtime.block_on(async {
            let query = self.driver.query(to_by(locator)).wait(timeout, POLL_INTERVAL);
            if displayed {
                query.and_displayed().first().await
            } else {
                query.first().await
            }
        });
        result.map(|_| ()).map_err(|e| {
            debug!("wait for {} failed: {}", locator, e);
            BrowserError::Timeout {
                selector: locator.as_str().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
        })
    }

    /// Replay held-back cookies and local storage into the page that just loaded
    fn replay_storage_state(&mut self) -> BrowserResult<()> {
        let Some(state) = self.pending_state.as_ref() else {
            return Ok(());
        };
        let url = self
            .runtime
            .block_on(self.driver.current_url())
            .map_err(driver_error)?;
        let Some(host) = url.host_str().map(str::to_string) else {
            return Ok(());
        };
        if self.restored_hosts.contains(&host) {
            return Ok(());
        }

        let cookies = state.cookies_for_host(&host);
        let entries = state
            .origin(&url.origin().ascii_serialization())
            .map(|origin| origin.local_storage.clone())
            .unwrap_or_default();

        if !cookies.is_empty() || !entries.is_empty() {
            info!(
                "Restoring {} cookies and {} local storage entries for {}",
                cookies.len(),
                entries.len(),
                host
            );
            let cookies = cookies
                .into_iter()
                .map(|cookie| serde_json::from_value::<Cookie>(cookie_to_webdriver(cookie)))
                .collect::<Result<Vec<_>, _>>()?;
            let entries = serde_json::to_value(&entries)?;

            self.runtime
                .block_on(async {
                    for cookie in cookies {
                        self.driver.add_cookie(cookie).await?;
                    }
                    self.driver
                        .execute(WRITE_LOCAL_STORAGE, vec![entries])
                        .await?;
                    self.driver.refresh().await
                })
                .map_err(driver_error)?;
        }

        self.restored_hosts.insert(host);
        Ok(())
    }
}

impl PageDriver for WebDriverPage {
    type Element = WebDriverElement;

    fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.runtime
            .block_on(self.driver.goto(url))
            .map_err(driver_error)?;
        self.replay_storage_state()
    }

    fn current_url(&self) -> BrowserResult<Option<String>> {
        let url = self
            .runtime
            .block_on(self.driver.current_url())
            .map_err(driver_error)?
            .to_string();
        if BLANK_URLS.contains(&url.as_str()) {
            Ok(None)
        } else {
            Ok(Some(url))
        }
    }

    fn query_actionable_elements(&self) -> BrowserResult<Vec<WebDriverElement>> {
        let elements = self
            .runtime
            .block_on(self.driver.find_all(By::Css(ACTIONABLE_ELEMENTS_QUERY)))
            .map_err(driver_error)?;
        Ok(elements
            .into_iter()
            .map(|element| WebDriverElement {
                element,
                runtime: Arc::clone(&self.runtime),
            })
            .collect())
    }

    fn wait_visible(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        self.wait(locator, timeout, true)
    }

    fn fill(&mut self, locator: &Locator, text: &str) -> BrowserResult<()> {
        let element = self.find(locator)?;
        self.runtime
            .block_on(async {
                element.clear().await?;
                element.send_keys(text).await
            })
            .map_err(driver_error)
    }

    fn click(&mut self, locator: &Locator) -> BrowserResult<()> {
        let element = self.find(locator)?;
        self.runtime
            .block_on(element.click())
            .map_err(driver_error)
    }

    fn inner_text(&self, locator: &Locator) -> BrowserResult<String> {
        let element = self.find(locator)?;
        self.runtime
            .block_on(element.text())
            .map_err(driver_error)
    }

    fn wait_for_selector(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        self.wait(locator, timeout, false)
    }

    fn screenshot(&self, path: &Path) -> BrowserResult<()> {
        self.runtime
            .block_on(self.driver.screenshot(path))
            .map_err(driver_error)
    }

    fn storage_state(&self) -> BrowserResult<StorageState> {
        let (cookies, url, entries) = self
            .runtime
            .block_on(async {
                let cookies = self.driver.get_all_cookies().await?;
                let url = self.driver.current_url().await?;
                let entries = self.driver.execute(READ_LOCAL_STORAGE, Vec::new()).await?;
                Ok::<_, WebDriverError>((cookies, url, entries.json().clone()))
            })
            .map_err(driver_error)?;

        let cookies = cookies
            .iter()
            .map(|cookie| serde_json::to_value(cookie).map(cookie_from_webdriver))
            .collect::<Result<Vec<_>, _>>()?;

        let mut origins = Vec::new();
        if url.host_str().is_some() {
            let local_storage: Vec<StorageEntry> = serde_json::from_value(entries)?;
            if !local_storage.is_empty() {
                origins.push(OriginStorage {
                    origin: url.origin().ascii_serialization(),
                    local_storage,
                });
            }
        }

        Ok(StorageState { cookies, origins })
    }

    fn restore_storage_state(&mut self, state: StorageState) -> BrowserResult<()> {
        self.pending_state = Some(state);
        self.restored_hosts.clear();
        Ok(())
    }

    fn close(self) -> BrowserResult<()> {
        self.runtime
            .block_on(self.driver.quit())
            .map_err(driver_error)
    }
}
