use serde::{Deserialize, Serialize};
use std::fmt;

/// What a planned action does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// Navigate to the URL held in `selector`
    Open,
    /// Type `value` into `selector`
    Fill,
    /// Click `selector`
    Click,
    /// Check that `selector`'s text contains `expected`
    Assert,
    /// Wait for `selector` to appear
    Wait,
    /// Diagnostic only; carries `message`, no browser call
    Explain,
    /// Anything the model invented
    Other(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Open => "open",
            ActionKind::Fill => "fill",
            ActionKind::Click => "click",
            ActionKind::Assert => "assert",
            ActionKind::Wait => "wait",
            ActionKind::Explain => "explain",
            ActionKind::Other(name) => name,
        }
    }

    /// Whether executing this kind touches the browser (and so needs a selector)
    pub fn needs_selector(&self) -> bool {
        matches!(
            self,
            ActionKind::Open | ActionKind::Fill | ActionKind::Click | ActionKind::Assert | ActionKind::Wait
        )
    }
}

impl From<String> for ActionKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "open" => ActionKind::Open,
            "fill" => ActionKind::Fill,
            "click" => ActionKind::Click,
            "assert" => ActionKind::Assert,
            "wait" => ActionKind::Wait,
            "explain" => ActionKind::Explain,
            _ => ActionKind::Other(name),
        }
    }
}

impl From<&str> for ActionKind {
    fn from(name: &str) -> Self {
        ActionKind::from(name.to_string())
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One canonical browser operation derived from an instruction.
///
/// `kind` is `None` when the model produced a shape the normalizer could not
/// recognize; the executor reports those as unknown actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "action", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActionKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Action {
    fn with_kind(kind: ActionKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn open(url: impl Into<String>) -> Self {
        Self::with_kind(ActionKind::Open).selector(url)
    }

    pub fn fill(selector: impl Into<String>, value: impl Into<String>) -> Self {
        let mut action = Self::with_kind(ActionKind::Fill).selector(selector);
        action.value = Some(value.into());
        action
    }

    pub fn click(selector: impl Into<String>) -> Self {
        Self::with_kind(ActionKind::Click).selector(selector)
    }

    pub fn assert_text(selector: impl Into<String>, expected: impl Into<String>) -> Self {
        let mut action = Self::with_kind(ActionKind::Assert).selector(selector);
        action.expected = Some(expected.into());
        action
    }

    pub fn wait(selector: impl Into<String>) -> Self {
        Self::with_kind(ActionKind::Wait).selector(selector)
    }

    pub fn explain(message: impl Into<String>) -> Self {
        let mut action = Self::with_kind(ActionKind::Explain);
        action.message = Some(message.into());
        action
    }

    fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Kind name for diagnostics; `None` renders as `None` like the model would see it
    pub fn kind_name(&self) -> &str {
        self.kind.as_ref().map(ActionKind::as_str).unwrap_or("None")
    }
}

/// Why planning fell back to a synthetic `explain` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PlanFailure {
    /// The LLM call itself failed (network, auth, rate limit, timeout)
    Transport(String),
    /// The model answered but no JSON action array could be recovered
    Parse(String),
}

/// Output of one planning call
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Normalized actions; never empty
    pub actions: Vec<Action>,
    /// Set when `actions` is the single fallback `explain` action
    pub failure: Option<PlanFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_kind_as_action_key() {
        let action = Action::fill("#email", "a@b.com");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "action": "fill", "selector": "#email", "value": "a@b.com" })
        );
    }

    #[test]
    fn test_unknown_kind_round_trips_name() {
        let action: Action = serde_json::from_str(r#"{"action": "dance"}"#).unwrap();
        assert_eq!(action.kind, Some(ActionKind::Other("dance".to_string())));
        assert_eq!(action.kind_name(), "dance");
        assert_eq!(serde_json::to_string(&action).unwrap(), r#"{"action":"dance"}"#);
    }

    #[test]
    fn test_plan_failure_serialization() {
        let failure = PlanFailure::Transport("timeout".to_string());
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            serde_json::json!({ "kind": "transport", "detail": "timeout" })
        );
    }
}
