use tracing::{debug, info, warn};

use super::types::{ElementSummary, PageSnapshotCache, position_hint, truncate_text};
use crate::browser::{BrowserResult, ElementHandle, PageDriver};

/// Summarize the actionable elements of the page `driver` is showing.
///
/// A cached URL short-circuits the element query entirely. With no page
/// loaded, or when the query itself fails, the result is empty and nothing is
/// cached. Individual elements that fail to read are skipped.
pub fn summarize_page<D: PageDriver>(
    driver: &D,
    cache: &mut PageSnapshotCache,
) -> BrowserResult<Vec<ElementSummary>> {
    let Some(url) = driver.current_url()? else {
        return Ok(Vec::new());
    };

    if let Some(cached) = cache.get(&url) {
        debug!("Using cached DOM for {}", url);
        return Ok(cached.to_vec());
    }

    info!("Scraping page elements for LLM context.");
    let elements = match driver.query_actionable_elements() {
        Ok(elements) => elements,
        Err(e) => {
            warn!("Failed to query elements: {}", e);
            return Ok(Vec::new());
        }
    };

    let summary: Vec<ElementSummary> = elements
        .iter()
        .filter_map(|element| match describe_element(element) {
            Ok(described) => Some(described),
            Err(e) => {
                debug!("Skipping element: {}", e);
                None
            }
        })
        .collect();

    info!("Collected {} elements from {}", summary.len(), url);
    Ok(cache.insert(url, summary).to_vec())
}

/// Read one element; any accessor failure drops the whole element
fn describe_element<E: ElementHandle>(element: &E) -> BrowserResult<ElementSummary> {
    let tag = element.tag_name()?.to_lowercase();
    Ok(ElementSummary {
        text: truncate_text(&element.inner_text()?),
        id: element.attribute("id")?,
        test_id: element.attribute("data-testid")?,
        name: element.attribute("name")?,
        placeholder: element.attribute("placeholder")?,
        aria_label: element.attribute("aria-label")?,
        position_hint: position_hint(&tag, element.sibling_index()?),
        visible: element.is_visible()?,
        tag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockDriver, MockElement, MockPage};
    use pretty_assertions::assert_eq;

    const URL: &str = "https://shop.test/login";

    fn login_page() -> MockPage {
        MockPage::new()
            .element(
                MockElement::new("input")
                    .attr("id", "email")
                    .attr("name", "email")
                    .attr("placeholder", "Email")
                    .nth(2),
            )
            .element(MockElement::new("button").text("  Sign in  ").attr("data-testid", "login-submit").nth(4))
            .element(MockElement::new("a").text("Help").attr("aria-label", "Help center").hidden())
    }

    #[test]
    fn test_summarize_extracts_attributes() {
        let driver = MockDriver::new().page(URL, login_page()).at(URL);
        let mut cache = PageSnapshotCache::new();

        let summary = summarize_page(&driver, &mut cache).unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(
            summary[0],
            ElementSummary {
                tag: "input".into(),
                text: String::new(),
                id: Some("email".into()),
                test_id: None,
                name: Some("email".into()),
                placeholder: Some("Email".into()),
                aria_label: None,
                position_hint: "input[2]".into(),
                visible: true,
            }
        );
        assert_eq!(summary[1].text, "Sign in");
        assert_eq!(summary[1].test_id.as_deref(), Some("login-submit"));
        assert_eq!(summary[1].position_hint, "button[4]");
        assert!(!summary[2].visible);
        assert_eq!(summary[2].aria_label.as_deref(), Some("Help center"));
    }

    #[test]
    fn test_second_call_hits_cache() {
        let driver = MockDriver::new().page(URL, login_page()).at(URL);
        let mut cache = PageSnapshotCache::new();

        let first = summarize_page(&driver, &mut cache).unwrap();
        let second = summarize_page(&driver, &mut cache).unwrap();
        assert_eq!(first, second);
        assert_eq!(driver.query_count(), 1);
    }

    #[test]
    fn test_detached_elements_are_skipped() {
        let page = login_page().element(MockElement::new("select").detached());
        let driver = MockDriver::new().page(URL, page).at(URL);
        let summary = summarize_page(&driver, &mut PageSnapshotCache::new()).unwrap();
        assert_eq!(summary.len(), 3);
        assert!(summary.iter().all(|e| e.tag != "select"));
    }

    #[test]
    fn test_no_page_is_empty() {
        let driver = MockDriver::new();
        let mut cache = PageSnapshotCache::new();
        assert!(summarize_page(&driver, &mut cache).unwrap().is_empty());
        assert_eq!(driver.query_count(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_query_failure_is_empty_and_uncached() {
        let driver = MockDriver::new().page(URL, login_page()).at(URL).failing_queries();
        let mut cache = PageSnapshotCache::new();
        assert!(summarize_page(&driver, &mut cache).unwrap().is_empty());
        assert!(!cache.contains(URL));
    }

    #[test]
    fn test_long_text_is_truncated() {
        let page = MockPage::new().element(MockElement::new("button").text("x".repeat(500)));
        let driver = MockDriver::new().page(URL, page).at(URL);
        let summary = summarize_page(&driver, &mut PageSnapshotCache::new()).unwrap();
        assert_eq!(summary[0].text.len(), 200);
    }
}
