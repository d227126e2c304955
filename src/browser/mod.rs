//! Browser driver abstraction.
//!
//! The summarizer and executor never talk to a browser directly; they go
//! through [`PageDriver`], which has two implementations:
//! - `WebDriverPage` drives a real browser over the WebDriver protocol
//! - `MockDriver` serves a scripted page for tests

pub mod mock;
pub mod selector;
pub mod webdriver;

pub use mock::{MockDriver, MockElement, MockPage};
pub use selector::Locator;
pub use webdriver::WebDriverPage;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// CSS query matching every element worth describing to the model
pub const ACTIONABLE_ELEMENTS_QUERY: &str = "[data-testid], input, button, a, select, textarea";

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Error types for browser operations
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// The session was used before launch or after close. Never recovered.
    #[error("browser session unavailable: {0}")]
    SessionUnavailable(&'static str),

    /// No element matched the selector
    #[error("no element matches '{0}'")]
    NotFound(String),

    /// The element did not appear or become visible in time
    #[error("timed out after {timeout_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, timeout_ms: u64 },

    /// Element text did not contain the expected substring
    #[error("assertion failed for '{selector}': expected '{expected}', got '{actual}'")]
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
    },

    /// Element handle went stale or the node was detached
    #[error("stale element: {0}")]
    StaleElement(String),

    /// Any other driver-level failure
    #[error("webdriver error: {0}")]
    Driver(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrowserError {
    /// Whether this error means the whole session is unusable, not just one action
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrowserError::SessionUnavailable(_))
    }
}

/// Accessors for one element returned by [`PageDriver::query_actionable_elements`].
///
/// Every accessor can fail independently (e.g. the node was detached between
/// query and read); the summarizer skips such elements.
pub trait ElementHandle {
    fn tag_name(&self) -> BrowserResult<String>;

    fn inner_text(&self) -> BrowserResult<String>;

    fn attribute(&self, name: &str) -> BrowserResult<Option<String>>;

    /// 1-based position among the element's siblings
    fn sibling_index(&self) -> BrowserResult<usize>;

    fn is_visible(&self) -> BrowserResult<bool>;
}

/// The browser primitives the core pipeline depends on
pub trait PageDriver {
    type Element: ElementHandle;

    /// Navigate and wait for the load event
    fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// URL of the loaded page, `None` when nothing has been loaded yet
    fn current_url(&self) -> BrowserResult<Option<String>>;

    /// All elements matching [`ACTIONABLE_ELEMENTS_QUERY`], in document order
    fn query_actionable_elements(&self) -> BrowserResult<Vec<Self::Element>>;

    /// Wait until the first match is displayed
    fn wait_visible(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()>;

    /// Replace the contents of an input
    fn fill(&mut self, locator: &Locator, text: &str) -> BrowserResult<()>;

    fn click(&mut self, locator: &Locator) -> BrowserResult<()>;

    /// Rendered text of the first match
    fn inner_text(&self, locator: &Locator) -> BrowserResult<String>;

    /// Wait until the selector matches anything
    fn wait_for_selector(&self, locator: &Locator, timeout: Duration) -> BrowserResult<()>;

    /// Save a PNG screenshot of the viewport
    fn screenshot(&self, path: &Path) -> BrowserResult<()>;

    /// Cookies and local storage of the current page
    fn storage_state(&self) -> BrowserResult<StorageState>;

    /// Queue a previously saved state to be replayed into matching pages
    fn restore_storage_state(&mut self, state: StorageState) -> BrowserResult<()>;

    /// End the browser session
    fn close(self) -> BrowserResult<()>;
}

/// Persisted browser session data (cookies, local storage) enabling login reuse across runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    /// Cookies in Playwright's layout (`expires` in seconds, `-1` for session cookies)
    #[serde(default)]
    pub cookies: Vec<serde_json::Value>,

    #[serde(default)]
    pub origins: Vec<OriginStorage>,
}

/// Local storage entries saved for one origin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginStorage {
    pub origin: String,

    #[serde(rename = "localStorage", default)]
    pub local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

impl StorageState {
    /// Load a storage state file
    pub fn load(path: &Path) -> BrowserResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the state as pretty JSON
    pub fn save(&self, path: &Path) -> BrowserResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Cookies whose domain covers `host`
    pub fn cookies_for_host(&self, host: &str) -> Vec<serde_json::Value> {
        self.cookies
            .iter()
            .filter(|cookie| {
                cookie
                    .get("domain")
                    .and_then(|d| d.as_str())
                    .map(|domain| domain_matches(domain, host))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    pub fn origin(&self, origin: &str) -> Option<&OriginStorage> {
        self.origins.iter().find(|o| o.origin == origin)
    }
}

/// Convert a Playwright cookie into the WebDriver shape (`expires` becomes `expiry`)
pub fn cookie_to_webdriver(mut cookie: serde_json::Value) -> serde_json::Value {
    if let Some(map) = cookie.as_object_mut() {
        if let Some(expires) = map.remove("expires") {
            if let Some(secs) = expires.as_f64().filter(|secs| *secs > 0.0) {
                map.insert("expiry".to_string(), serde_json::Value::from(secs as i64));
            }
        }
    }
    cookie
}

/// Convert a WebDriver cookie into Playwright's layout
pub fn cookie_from_webdriver(mut cookie: serde_json::Value) -> serde_json::Value {
    if let Some(map) = cookie.as_object_mut() {
        let expires = map
            .remove("expiry")
            .filter(|expiry| !expiry.is_null())
            .unwrap_or_else(|| serde_json::Value::from(-1));
        map.insert("expires".to_string(), expires);
    }
    cookie
}

/// Cookie domain matching: `.example.com` and `example.com` both cover `www.example.com`
fn domain_matches(domain: &str, host: &str) -> bool {
    let domain = domain.trim_start_matches('.');
    host == domain || host.ends_with(&format!(".{}", domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_matches() {
        assert!(domain_matches(".example.com", "www.example.com"));
        assert!(domain_matches("example.com", "example.com"));
        assert!(!domain_matches("example.com", "badexample.com"));
    }

    #[test]
    fn test_storage_state_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = StorageState {
            cookies: vec![serde_json::json!({"name": "sid", "value": "abc", "domain": ".example.com"})],
            origins: vec![OriginStorage {
                origin: "https://example.com".to_string(),
                local_storage: vec![StorageEntry {
                    name: "theme".to_string(),
                    value: "dark".to_string(),
                }],
            }],
        };
        state.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"localStorage\""));

        let loaded = StorageState::load(&path).unwrap();
        assert_eq!(loaded.cookies_for_host("app.example.com").len(), 1);
        assert!(loaded.cookies_for_host("other.org").is_empty());
        assert_eq!(loaded.origin("https://example.com").unwrap().local_storage.len(), 1);
    }

    #[test]
    fn test_cookie_expiry_maps_between_layouts() {
        let saved = serde_json::json!({"name": "sid", "value": "abc", "domain": "shop.test", "expires": 1767225600.5});
        let webdriver = cookie_to_webdriver(saved);
        assert_eq!(webdriver["expiry"], 1767225600_i64);
        assert!(webdriver.get("expires").is_none());

        let back = cookie_from_webdriver(webdriver);
        assert_eq!(back["expires"], 1767225600_i64);
        assert!(back.get("expiry").is_none());
    }

    #[test]
    fn test_session_cookie_has_no_expiry() {
        let session = serde_json::json!({"name": "sid", "value": "abc", "expires": -1});
        assert!(cookie_to_webdriver(session).get("expiry").is_none());

        let from_driver = cookie_from_webdriver(serde_json::json!({"name": "sid", "value": "abc"}));
        assert_eq!(from_driver["expires"], -1);
    }
}
