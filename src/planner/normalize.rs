//! Turning whatever the model emitted into canonical [`Action`]s.
//!
//! Models answer either verbosely (`{"action": "click", "selector": "#x"}`) or in
//! shorthand (`{"click": "#x"}`, `{"fill": {"selector": "#x", "value": "y"}}`).
//! Normalization is total: shapes it cannot recognize pass through with no kind.

use serde_json::{Map, Value};

use super::types::{Action, ActionKind};

/// Shorthand keys, in the order they are tried
const SHORTHAND_KEYS: [(&str, ActionKind); 6] = [
    ("click", ActionKind::Click),
    ("fill", ActionKind::Fill),
    ("assert", ActionKind::Assert),
    ("wait", ActionKind::Wait),
    ("open", ActionKind::Open),
    ("explain", ActionKind::Explain),
];

/// Normalize one raw model action.
pub fn normalize(raw: &Value) -> Action {
    let Some(object) = raw.as_object() else {
        return Action {
            message: Some(raw.to_string()),
            ..Default::default()
        };
    };

    if object.contains_key("action") {
        return serde_json::from_value::<Action>(raw.clone())
            .unwrap_or_else(|_| decode_fields(object, kind_from_value(&object["action"])));
    }

    for (key, kind) in SHORTHAND_KEYS {
        let Some(body) = object.get(key) else {
            continue;
        };
        return match body {
            Value::String(selector) => Action {
                kind: Some(kind),
                selector: Some(selector.clone()),
                ..Default::default()
            },
            Value::Object(fields) => decode_fields(fields, Some(kind)),
            _ => Action {
                kind: Some(kind),
                ..Default::default()
            },
        };
    }

    decode_fields(object, None)
}

/// Normalize a whole plan
pub fn normalize_all(raw: &[Value]) -> Vec<Action> {
    raw.iter().map(normalize).collect()
}

/// Field-by-field decode that tolerates numbers and booleans where strings belong
fn decode_fields(fields: &Map<String, Value>, kind: Option<ActionKind>) -> Action {
    Action {
        kind: kind.or_else(|| fields.get("action").and_then(kind_from_value)),
        selector: scalar_string(fields.get("selector")),
        value: scalar_string(fields.get("value")),
        expected: scalar_string(fields.get("expected")),
        message: scalar_string(fields.get("message")),
    }
}

fn kind_from_value(value: &Value) -> Option<ActionKind> {
    match value {
        Value::Null => None,
        Value::String(name) => Some(ActionKind::from(name.clone())),
        other => Some(ActionKind::Other(other.to_string())),
    }
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_canonical_passes_through() {
        let raw = json!({"action": "click", "selector": "#x"});
        assert_eq!(normalize(&raw), Action::click("#x"));
    }

    #[test]
    fn test_idempotent_on_canonical_actions() {
        let actions = vec![
            Action::open("https://example.com"),
            Action::fill("#email", "a@b.com"),
            Action::assert_text("#welcome", "Welcome"),
            Action::explain("no plan"),
        ];
        for action in actions {
            let once = normalize(&serde_json::to_value(&action).unwrap());
            let twice = normalize(&serde_json::to_value(&once).unwrap());
            assert_eq!(once, action);
            assert_eq!(twice, action);
        }
    }

    #[test]
    fn test_shorthand_string_becomes_selector() {
        assert_eq!(normalize(&json!({"click": "#x"})), Action::click("#x"));
        assert_eq!(normalize(&json!({"wait": ".spinner"})), Action::wait(".spinner"));
    }

    #[test]
    fn test_shorthand_object_is_merged() {
        let raw = json!({"fill": {"selector": "#email", "value": "a@b.com"}});
        assert_eq!(normalize(&raw), Action::fill("#email", "a@b.com"));
    }

    #[test]
    fn test_shorthand_priority_order() {
        // click wins over fill regardless of key order in the object
        let raw = json!({"fill": "#name", "click": "#submit"});
        assert_eq!(normalize(&raw), Action::click("#submit"));
    }

    #[test]
    fn test_lenient_scalars() {
        let raw = json!({"action": "fill", "selector": "#age", "value": 42});
        assert_eq!(normalize(&raw), Action::fill("#age", "42"));
    }

    #[test]
    fn test_non_string_kind_is_other() {
        let raw = json!({"action": 7, "selector": "#x"});
        let action = normalize(&raw);
        assert_eq!(action.kind, Some(ActionKind::Other("7".to_string())));
        assert_eq!(action.selector.as_deref(), Some("#x"));
    }

    #[test]
    fn test_unrecognized_shape_has_no_kind() {
        let action = normalize(&json!({"dance": "#floor"}));
        assert_eq!(action.kind, None);

        let action = normalize(&json!("click the button"));
        assert_eq!(action.kind, None);
        assert_eq!(action.message.as_deref(), Some("\"click the button\""));
    }
}
