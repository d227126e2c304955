//! Mapping model-written selectors onto WebDriver locator strategies.
//!
//! Models write Playwright-flavoured selectors (`text=Login`,
//! `button:has-text('Accept all')`) and may echo back positional hints from the
//! page summary (`button[3]`). WebDriver only understands CSS and XPath, so each
//! form is translated here.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A selector resolved to a concrete WebDriver strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

fn has_text_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^([A-Za-z][A-Za-z0-9-]*)?:has-text\((?:'([^']*)'|"([^"]*)")\)$"#)
            .expect("valid has-text pattern")
    })
}

fn position_hint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z][a-z0-9-]*)\[(\d+)\]$").expect("valid position hint pattern")
    })
}

impl Locator {
    /// Resolve a selector string
    pub fn parse(selector: &str) -> Self {
        let selector = selector.trim();

        if let Some(css) = selector.strip_prefix("css=") {
            return Locator::Css(css.to_string());
        }
        if let Some(xpath) = selector.strip_prefix("xpath=") {
            return Locator::XPath(xpath.to_string());
        }
        if selector.starts_with("//") || selector.starts_with("(//") {
            return Locator::XPath(selector.to_string());
        }
        if let Some(text) = selector.strip_prefix("text=") {
            let text = unquote(text);
            return Locator::XPath(format!(
                "//*[text()[contains(normalize-space(.), {})]]",
                xpath_literal(text)
            ));
        }
        if let Some(caps) = has_text_pattern().captures(selector) {
            let tag = caps.get(1).map(|m| m.as_str()).unwrap_or("*");
            let text = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            return Locator::XPath(format!(
                "//{}[contains(normalize-space(.), {})]",
                tag,
                xpath_literal(text)
            ));
        }
        if let Some(caps) = position_hint_pattern().captures(selector) {
            return Locator::XPath(format!("//*[{}][self::{}]", &caps[2], &caps[1]));
        }

        Locator::Css(selector.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Locator::Css(s) | Locator::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

/// Quote a string for use inside an XPath expression
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
