//! Browser session management.
//!
//! Owns the page driver and everything scoped to its lifetime:
//! - The snapshot cache (one element scan per URL per session)
//! - The per-action visibility timeout
//! - Storage-state load/save and screenshots
//!
//! Only the session closes the driver. Callers borrow it for one test at a time.

use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::browser::{BrowserError, BrowserResult, Locator, PageDriver, StorageState};
use crate::config::DEFAULT_ACTION_TIMEOUT_MS;
use crate::snapshot::{ElementSummary, PageSnapshotCache, summarize_page};

/// A browser session: at most one driver, plus its snapshot cache
#[derive(Debug)]
pub struct BrowserSession<D: PageDriver> {
    driver: Option<D>,
    snapshot_cache: PageSnapshotCache,
    action_timeout: Duration,
}

impl<D: PageDriver> BrowserSession<D> {
    /// Create a session with no driver yet; every browser operation fails until [`launch`](Self::launch)
    pub fn new() -> Self {
        Self {
            driver: None,
            snapshot_cache: PageSnapshotCache::new(),
            action_timeout: Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS),
        }
    }

    /// Create a session around an already started driver
    pub fn with_driver(driver: D) -> Self {
        let mut session = Self::new();
        session.launch(driver);
        session
    }

    /// Set the visibility wait used by fill/click/assert/wait
    pub fn action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Attach a started driver
    pub fn launch(&mut self, driver: D) {
        self.driver = Some(driver);
        info!("Browser launched successfully.");
    }

    pub fn is_active(&self) -> bool {
        self.driver.is_some()
    }

    /// The driver, or [`BrowserError::SessionUnavailable`]
    pub fn driver(&self) -> BrowserResult<&D> {
        self.driver
            .as_ref()
            .ok_or(BrowserError::SessionUnavailable("no page available, launch the browser first"))
    }

    fn driver_mut(&mut self) -> BrowserResult<&mut D> {
        self.driver
            .as_mut()
            .ok_or(BrowserError::SessionUnavailable("no page available, launch the browser first"))
    }

    pub fn snapshot_cache(&self) -> &PageSnapshotCache {
        &self.snapshot_cache
    }

    /// Start a fresh context, optionally seeded from a saved storage state file
    pub fn new_context(&mut self, storage_state: Option<&Path>) -> BrowserResult<()> {
        match storage_state {
            Some(path) => {
                info!("Creating new browser context with storage state: {}", path.display());
                let state = StorageState::load(path)?;
                self.driver_mut()?.restore_storage_state(state)
            }
            None => {
                info!("Creating new browser context (no storage state).");
                self.driver().map(|_| ())
            }
        }
    }

    pub fn open_page(&mut self, url: &str) -> BrowserResult<()> {
        info!("Opening page: {}", url);
        let driver = self.driver_mut()?;
        driver.navigate(url)?;
        if let Some(loaded) = driver.current_url()? {
            info!("Page loaded: {}", loaded);
        }
        Ok(())
    }

    /// Summarize the current page for the model.
    ///
    /// Returns an empty list when no browser is attached.
    pub fn describe_page(&mut self) -> BrowserResult<Vec<ElementSummary>> {
        match self.driver.as_ref() {
            Some(driver) => summarize_page(driver, &mut self.snapshot_cache),
            None => Ok(Vec::new()),
        }
    }

    pub fn fill(&mut self, selector: &str, text: &str) -> BrowserResult<()> {
        info!("Filling '{}' with '{}'", selector, text);
        let locator = Locator::parse(selector);
        let timeout = self.action_timeout;
        let driver = self.driver_mut()?;
        warn_on_failure(
            driver
                .wait_visible(&locator, timeout)
                .and_then(|_| driver.fill(&locator, text)),
            || format!("Failed to fill {}", selector),
        )
    }

    pub fn click(&mut self, selector: &str) -> BrowserResult<()> {
        info!("Clicking element '{}'", selector);
        let locator = Locator::parse(selector);
        let timeout = self.action_timeout;
        let driver = self.driver_mut()?;
        warn_on_failure(
            driver
                .wait_visible(&locator, timeout)
                .and_then(|_| driver.click(&locator)),
            || format!("Click failed for {}", selector),
        )
    }

    /// Check that the element's text contains `expected` (trimmed)
    pub fn assert_text(&self, selector: &str, expected: &str) -> BrowserResult<()> {
        info!("Asserting that '{}' contains text '{}'", selector, expected);
        let locator = Locator::parse(selector);
        let driver = self.driver()?;

        let actual = warn_on_failure(
            driver
                .wait_visible(&locator, self.action_timeout)
                .and_then(|_| driver.inner_text(&locator)),
            || format!("Assertion error for {}", selector),
        )?;

        let expected = expected.trim();
        if actual.contains(expected) {
            Ok(())
        } else {
            warn!("Assertion failed: expected '{}', got '{}'", expected, actual);
            Err(BrowserError::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
            })
        }
    }

    pub fn wait_for(&self, selector: &str) -> BrowserResult<()> {
        info!("Waiting for selector '{}' to appear.", selector);
        let locator = Locator::parse(selector);
        warn_on_failure(
            self.driver()?.wait_for_selector(&locator, self.action_timeout),
            || format!("Wait failed for {}", selector),
        )
    }

    pub fn save_screenshot(&self, path: &Path) -> BrowserResult<()> {
        self.driver()?.screenshot(path)?;
        info!("Screenshot saved: {}", path.display());
        Ok(())
    }

    pub fn save_storage_state(&self, path: &Path) -> BrowserResult<()> {
        self.driver()?.storage_state()?.save(path)?;
        info!("Storage state saved: {}", path.display());
        Ok(())
    }

    /// Block until the operator presses Enter, e.g. after logging in by hand
    pub fn pause_for_manual_login(&self, input: &mut impl BufRead) -> BrowserResult<()> {
        self.driver()?;
        info!("Manual login pause. Perform login in browser, then press Enter to continue...");
        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(())
    }

    /// Close the browser. Closing an inactive session is a no-op.
    pub fn close(&mut self) -> BrowserResult<()> {
        info!("Closing browser session.");
        match self.driver.take() {
            Some(driver) => {
                driver.close()?;
                info!("Browser session closed cleanly.");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<D: PageDriver> Default for BrowserSession<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn warn_on_failure<T>(
    result: BrowserResult<T>,
    context: impl FnOnce() -> String,
) -> BrowserResult<T> {
    if let Err(e) = &result {
        warn!("{}: {}", context(), e);
    }
    result
}
