//! Recovering a JSON action array from free-form model output.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Greedy: from the first `[` to the last `]`, across newlines
fn array_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[[\s\S]*\]").expect("valid array pattern"))
}

fn trailing_comma_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma pattern"))
}

/// Extract the action array embedded in `text`.
///
/// Tries a strict parse of the bracketed span first, then one repair pass
/// (single quotes to double quotes, trailing commas dropped). Returns `None`
/// when there is no array, when neither parse succeeds, or when the array is
/// empty; callers treat that as "no plan", not as an error.
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    let candidate = array_pattern().find(text)?.as_str();

    let parsed = serde_json::from_str::<Vec<Value>>(candidate)
        .ok()
        .or_else(|| serde_json::from_str::<Vec<Value>>(&repair(candidate)).ok())?;

    if parsed.is_empty() { None } else { Some(parsed) }
}

/// The lenient rewrite applied when strict parsing fails
fn repair(candidate: &str) -> String {
    let quoted = candidate.replace('\'', "\"");
    trailing_comma_pattern().replace_all(&quoted, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_extracts_array_from_chatter() {
        let text = "Sure! Here is the plan:\n[{\"action\": \"click\", \"selector\": \"#go\"}]\nGood luck.";
        assert_eq!(
            extract_json_array(text),
            Some(vec![json!({"action": "click", "selector": "#go"})])
        );
    }

    #[test]
    fn test_repairs_single_quotes_and_trailing_commas() {
        let text = "Sure! [{'action': 'click', 'selector': '#go',}]";
        assert_eq!(
            extract_json_array(text),
            Some(vec![json!({"action": "click", "selector": "#go"})])
        );
    }

    #[test]
    fn test_repairs_trailing_comma_in_array() {
        let text = "[{\"action\": \"wait\", \"selector\": \"#a\"},\n]";
        assert_eq!(
            extract_json_array(text),
            Some(vec![json!({"action": "wait", "selector": "#a"})])
        );
    }

    #[test]
    fn test_code_fenced_output() {
        let text = "```json\n[\n  {\"action\": \"open\", \"selector\": \"https://example.com\"}\n]\n```";
        let actions = extract_json_array(text).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0]["selector"], "https://example.com");
    }

    #[test]
    fn test_no_array_yields_none() {
        assert_eq!(extract_json_array("I cannot help with that."), None);
        assert_eq!(extract_json_array(""), None);
    }

    #[test]
    fn test_unrepairable_yields_none() {
        assert_eq!(extract_json_array("[{action: click}]"), None);
    }

    #[test]
    fn test_empty_array_yields_none() {
        assert_eq!(extract_json_array("Nothing to do: []"), None);
    }

    #[test]
    fn test_greedy_match_spans_to_last_bracket() {
        // Two arrays with prose between them do not form valid JSON.
        assert_eq!(extract_json_array("[1] and then [2]"), None);
    }
}
