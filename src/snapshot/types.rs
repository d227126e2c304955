// Core types for page summaries

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum characters of visible text kept per element
pub const MAX_TEXT_CHARS: usize = 200;

/// Snapshot of one actionable DOM element, as shown to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSummary {
    /// Lowercase tag name
    pub tag: String,

    /// Visible text, trimmed and truncated to [`MAX_TEXT_CHARS`]
    pub text: String,

    pub id: Option<String>,

    #[serde(rename = "data-testid")]
    pub test_id: Option<String>,

    pub name: Option<String>,

    pub placeholder: Option<String>,

    #[serde(rename = "aria-label")]
    pub aria_label: Option<String>,

    /// `<tag>[<1-based sibling index>]`, a last-resort locator
    #[serde(rename = "xpath_hint")]
    pub position_hint: String,

    pub visible: bool,
}

/// Per-session map from URL to the elements summarized there.
///
/// Entries are never refreshed: once a URL has been summarized, later calls
/// return the same list even if the DOM has changed since (e.g. after a click
/// opened a dialog). This trades accuracy for one element scan per URL.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshotCache {
    entries: HashMap<String, Vec<ElementSummary>>,
}

impl PageSnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&[ElementSummary]> {
        self.entries.get(url).map(Vec::as_slice)
    }

    /// Store the summary for `url`; an existing entry wins
    pub fn insert(&mut self, url: impl Into<String>, summary: Vec<ElementSummary>) -> &[ElementSummary] {
        self.entries.entry(url.into()).or_insert(summary)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Positional hint for an element: `button[3]`
pub fn position_hint(tag: &str, sibling_index: usize) -> String {
    format!("{}[{}]", tag.to_lowercase(), sibling_index)
}

/// Trim and cap text at [`MAX_TEXT_CHARS`] characters
pub fn truncate_text(text: &str) -> String {
    text.trim().chars().take(MAX_TEXT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_hint() {
        assert_eq!(position_hint("BUTTON", 3), "button[3]");
        assert_eq!(position_hint("a", 1), "a[1]");
    }

    #[test]
    fn test_truncate_text_counts_chars() {
        let long = "é".repeat(250);
        let truncated = truncate_text(&long);
        assert_eq!(truncated.chars().count(), MAX_TEXT_CHARS);
        assert_eq!(truncate_text("  Sign in \n"), "Sign in");
    }

    #[test]
    fn test_cache_first_entry_wins() {
        let mut cache = PageSnapshotCache::new();
        assert!(cache.is_empty());
        cache.insert("https://example.com", vec![]);
        let summary = vec![ElementSummary {
            tag: "a".into(),
            text: "Home".into(),
            id: None,
            test_id: None,
            name: None,
            placeholder: None,
            aria_label: None,
            position_hint: "a[1]".into(),
            visible: true,
        }];
        assert!(cache.insert("https://example.com", summary).is_empty());
        assert_eq!(cache.len(), 1);
    }
}
