//! A scripted in-memory page for testing
//!
//! Provides a full page model for exercising the pipeline without a browser:
//! - `MockPage` - elements reported to the summarizer plus selector targets
//! - `MockDriver` - navigation between scripted pages, call log, query counter
//! - `MockElement` - builder for summary elements, including detached ones

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use super::{BrowserError, BrowserResult, ElementHandle, Locator, PageDriver, StorageState};

/// PNG signature written by mock screenshots
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// One element as the summarizer sees it
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    tag: String,
    text: String,
    attributes: HashMap<String, String>,
    sibling_index: usize,
    visible: bool,
    detached: bool,
}

impl MockElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            sibling_index: 1,
            visible: true,
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// 1-based index among siblings
    pub fn nth(mut self, index: usize) -> Self {
        self.sibling_index = index;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Every accessor fails, as for a node removed after the query
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    fn check_attached(&self) -> BrowserResult<()> {
        if self.detached {
            Err(BrowserError::StaleElement(format!(
                "<{}> is no longer attached to the DOM",
                self.tag
            )))
        } else {
            Ok(())
        }
    }
}

impl ElementHandle for MockElement {
    fn tag_name(&self) -> BrowserResult<String> {
        self.check_attached()?;
        Ok(self.tag.to_uppercase())
    }

    fn inner_text(&self) -> BrowserResult<String> {
        self.check_attached()?;
        Ok(self.text.clone())
    }

    fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
        self.check_attached()?;
        Ok(self.attributes.get(name).cloned())
    }

    fn sibling_index(&self) -> BrowserResult<usize> {
        self.check_attached()?;
        Ok(self.sibling_index)
    }

    fn is_visible(&self) -> BrowserResult<bool> {
        self.check_attached()?;
        Ok(self.visible)
    }
}

/// A scripted page
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    elements: Vec<MockElement>,
    /// selector -> rendered text, for click/fill/assert/wait targets
    targets: HashMap<String, String>,
    /// targets that exist but never become visible
    hidden: HashSet<String>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element reported by the actionable-element query
    pub fn element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Make `selector` resolvable, rendering `text`
    pub fn target(mut self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.targets.insert(selector.into(), text.into());
        self
    }

    /// Make `selector` resolvable but never visible
    pub fn hidden_target(mut self, selector: impl Into<String>) -> Self {
        let selector = selector.into();
        self.targets.insert(selector.clone(), String::new());
        self.hidden.insert(selector);
        self
    }
}

/// Scripted [`PageDriver`]
#[derive(Debug, Default)]
pub struct MockDriver {
    pages: HashMap<String, MockPage>,
    current: Option<String>,
    query_count: Cell<usize>,
    calls: RefCell<Vec<String>>,
    filled: HashMap<String, String>,
    storage: StorageState,
    fail_queries: bool,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page reachable by `url`
    pub fn page(mut self, url: impl Into<String>, page: MockPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Start already navigated to `url`
    pub fn at(mut self, url: impl Into<String>) -> Self {
        self.current = Some(url.into());
        self
    }

    /// Make the actionable-element query itself fail
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// How many times the actionable-element query ran
    pub fn query_count(&self) -> usize {
        self.query_count.get()
    }

    /// Every driver call, in order, as `"<op> <target>"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Text most recently filled into `selector`
    pub fn filled(&self, selector: &str) -> Option<&str> {
        self.filled.get(selector).map(String::as_str)
    }

    /// Replace the page at `url`, e.g. to simulate a DOM change
    pub fn replace_page(&mut self, url: &str, page: MockPage) {
        self.pages.insert(url.to_string(), page);
    }

    fn record(&self, op: &str, target: &str) {
        self.calls.borrow_mut().push(format!("{} {}", op, target));
    }

    fn current_page(&self) -> BrowserResult<&MockPage> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .ok_or_else(|| BrowserError::Driver("no page loaded".to_string()))
    }

    fn target_text(&self, locator: &Locator) -> BrowserResult<&str> {
        self.current_page()?
            .targets
            .get(locator.as_str())
            .map(String::as_str)
            .ok_or_else(|| BrowserError::NotFound(locator.as_str().to_string()))
    }

    fn timeout(locator: &Locator, timeout: Duration) -> BrowserError {
        BrowserError::Timeout {
            selector: locator.as_str().to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

impl PageDriver for MockDriver {
    type Element = MockElement;

    fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.record("navigate", url);
        if !self.pages.contains_key(url) {
            return Err(BrowserError::Driver(format!(
                "net::ERR_NAME_NOT_RESOLVED at {}",
                url
            )));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> BrowserResult<Option<String>> {
        Ok(self.current.clone())
    }

    fn query_actionable_elements(&self) -> BrowserResult<Vec<MockElement>> {
        self.query_count.set(self.query_count.get() + 1);
        if self.fail_queries {
            return Err(BrowserError::Driver("query failed".to_string()));
        }
        Ok(self.current_page()?.elements.clone())
    }

    fn wait_visible(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        self.record("wait_visible", locator.as_str());
        let page = self.current_page()?;
        if page.targets.contains_key(locator.as_str()) && !page.hidden.contains(locator.as_str()) {
            Ok(())
        } else {
            Err(Self::timeout(locator, timeout))
        }
    }

    fn fill(&mut self, locator: &Locator, text: &str) -> BrowserResult<()> {
        self.record("fill", locator.as_str());
        self.target_text(locator)?;
        self.filled
            .insert(locator.as_str().to_string(), text.to_string());
        Ok(())
    }

    fn click(&mut self, locator: &Locator) -> BrowserResult<()> {
        self.record("click", locator.as_str());
        self.target_text(locator).map(|_| ())
    }

    fn inner_text(&self, locator: &Locator) -> BrowserResult<String> {
        self.record("inner_text", locator.as_str());
        self.target_text(locator).map(str::to_string)
    }

    fn wait_for_selector(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        self.record("wait_for_selector", locator.as_str());
        self.target_text(locator)
            .map(|_| ())
            .map_err(|_| Self::timeout(locator, timeout))
    }

    fn screenshot(&self, path: &Path) -> BrowserResult<()> {
        self.record("screenshot", &path.display().to_string());
        std::fs::write(path, PNG_MAGIC)?;
        Ok(())
    }

    fn storage_state(&self) -> BrowserResult<StorageState> {
        Ok(self.storage.clone())
    }

    fn restore_storage_state(&mut self, state: StorageState) -> BrowserResult<()> {
        self.storage = state;
        Ok(())
    }

    fn close(self) -> BrowserResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_element_accessors() {
        let el = MockElement::new("input").attr("id", "email").nth(3);
        assert_eq!(el.tag_name().unwrap(), "INPUT");
        assert_eq!(el.attribute("id").unwrap().as_deref(), Some("email"));
        assert_eq!(el.attribute("name").unwrap(), None);
        assert_eq!(el.sibling_index().unwrap(), 3);
        assert!(el.is_visible().unwrap());
    }

    #[test]
    fn test_detached_element_fails_every_accessor() {
        let el = MockElement::new("button").detached();
        assert!(el.tag_name().is_err());
        assert!(el.inner_text().is_err());
        assert!(el.is_visible().is_err());
    }

    #[test]
    fn test_navigation_and_targets() {
        let mut driver = MockDriver::new()
            .page("https://example.com", MockPage::new().target("#go", "Go"));

        assert_eq!(driver.current_url().unwrap(), None);
        assert!(driver.navigate("https://missing.test").is_err());
        driver.navigate("https://example.com").unwrap();

        let go = Locator::parse("#go");
        assert!(driver.click(&go).is_ok());
        assert!(matches!(
            driver.click(&Locator::parse("#nope")),
            Err(BrowserError::NotFound(_))
        ));
        assert_eq!(
            driver.calls(),
            vec![
                "navigate https://missing.test",
                "navigate https://example.com",
                "click #go",
                "click #nope",
            ]
        );
    }

    #[test]
    fn test_hidden_target_times_out() {
        let driver = MockDriver::new()
            .page("about:test", MockPage::new().hidden_target("#spinner"))
            .at("about:test");
        let err = driver
            .wait_visible(&Locator::parse("#spinner"), Duration::from_millis(250))
            .unwrap_err();
        assert!(matches!(err, BrowserError::Timeout { timeout_ms: 250, .. }));
    }
}
