//! Sequential execution of a planned action list against a browser session.

use tracing::{info, warn};

use crate::browser::{BrowserResult, PageDriver};
use crate::planner::{Action, ActionKind};
use crate::runner::{ActionFailure, FailureKind, TestResult};
use crate::session::BrowserSession;

/// Run `actions` in order, recording failures on `result`.
///
/// A failing action never stops the ones after it. The only error returned is
/// [`SessionUnavailable`](crate::browser::BrowserError::SessionUnavailable): without a browser nothing else can run.
pub fn execute_actions<D: PageDriver>(
    session: &mut BrowserSession<D>,
    actions: &[Action],
    result: &mut TestResult,
) -> BrowserResult<()> {
    for (index, action) in actions.iter().enumerate() {
        if let Some(failure) = execute_one(session, index, action)? {
            result.record(failure);
        }
    }
    Ok(())
}

/// Convenience wrapper producing a fresh [`TestResult`]
pub fn execute<D: PageDriver>(
    session: &mut BrowserSession<D>,
    instruction: &str,
    actions: Vec<Action>,
) -> BrowserResult<TestResult> {
    let mut result = TestResult::new(instruction);
    execute_actions(session, &actions, &mut result)?;
    result.actions = actions;
    info!("Executed {} actions, {} failed", result.actions.len(), result.errors.len());
    Ok(result)
}

fn execute_one<D: PageDriver>(
    session: &mut BrowserSession<D>,
    index: usize,
    action: &Action,
) -> BrowserResult<Option<ActionFailure>> {
    let failure = |kind, message: Option<String>, error: Option<String>| ActionFailure {
        kind,
        index: Some(index),
        action: Some(action.clone()),
        message,
        error,
    };

    let kind = match &action.kind {
        Some(kind) if kind.needs_selector() => kind,
        Some(ActionKind::Explain) => {
            let message = action.message.clone().unwrap_or_else(|| "explain step".to_string());
            return Ok(Some(failure(FailureKind::Explain, Some(message), None)));
        }
        _ => {
            warn!("Unknown action '{}' at index {}", action.kind_name(), index);
            return Ok(Some(failure(
                FailureKind::UnknownAction,
                Some(format!("Unknown action '{}'", action.kind_name())),
                None,
            )));
        }
    };

    let Some(selector) = action.selector.as_deref() else {
        return Ok(Some(failure(
            FailureKind::MissingSelector,
            Some(format!("Action '{}' has no selector", kind)),
            None,
        )));
    };

    let outcome = match kind {
        ActionKind::Open => session.open_page(selector),
        ActionKind::Fill => session.fill(selector, action.value.as_deref().unwrap_or("")),
        ActionKind::Click => session.click(selector),
        ActionKind::Assert => session.assert_text(selector, action.expected.as_deref().unwrap_or("")),
        ActionKind::Wait => session.wait_for(selector),
        ActionKind::Explain | ActionKind::Other(_) => Ok(()),
    };

    match outcome {
        Ok(()) => Ok(None),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => Ok(Some(failure(FailureKind::Execution, None, Some(e.to_string())))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockDriver, MockPage};
    use crate::runner::TestStatus;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const HOME: &str = "https://example.com/";

    fn session() -> BrowserSession<MockDriver> {
        let page = MockPage::new()
            .target("#accept", "Accept all")
            .target("#email", "")
            .target("#welcome", "Welcome");
        BrowserSession::with_driver(MockDriver::new().page(HOME, page))
            .action_timeout(Duration::from_millis(10))
    }

    #[test]
    fn test_all_actions_succeed() {
        let mut session = session();
        let actions = vec![
            Action::open(HOME),
            Action::click("#accept"),
            Action::fill("#email", "a@b.com"),
            Action::wait("#welcome"),
            Action::assert_text("#welcome", "Welcome"),
        ];
        let result = execute(&mut session, "log in", actions.clone()).unwrap();
        assert_eq!(result.status, TestStatus::Ok);
        assert!(result.errors.is_empty());
        assert_eq!(result.actions, actions);
    }

    #[test]
    fn test_unknown_action_does_not_stop_execution() {
        let mut session = session();
        let dance = Action {
            kind: Some(ActionKind::Other("dance".into())),
            ..Default::default()
        };
        let result = execute(&mut session, "x", vec![dance, Action::open(HOME)]).unwrap();

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, FailureKind::UnknownAction);
        assert_eq!(result.errors[0].message.as_deref(), Some("Unknown action 'dance'"));
        assert_eq!(
            session.driver().unwrap().calls(),
            vec![format!("navigate {}", HOME)]
        );
    }

    #[test]
    fn test_explain_is_recorded_without_browser_call() {
        let mut session = session();
        let result = execute(&mut session, "x", vec![Action::explain("model said no")]).unwrap();
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.errors[0].kind, FailureKind::Explain);
        assert_eq!(result.errors[0].message.as_deref(), Some("model said no"));
        assert!(session.driver().unwrap().calls().is_empty());
    }

    #[test]
    fn test_missing_selector() {
        let mut session = session();
        let click = Action {
            kind: Some(ActionKind::Click),
            ..Default::default()
        };
        let result = execute(&mut session, "x", vec![click]).unwrap();
        assert_eq!(result.errors[0].kind, FailureKind::MissingSelector);
        assert_eq!(result.errors[0].index, Some(0));
    }

    #[test]
    fn test_unlaunched_session_is_fatal() {
        let mut session: BrowserSession<MockDriver> = BrowserSession::new();
        let err = execute(&mut session, "x", vec![Action::open(HOME)]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_execution_error_keeps_action_and_index() {
        let mut session = session();
        let result = execute(
            &mut session,
            "x",
            vec![Action::open(HOME), Action::click("#missing"), Action::click("#accept")],
        )
        .unwrap();
        assert_eq!(result.errors.len(), 1);
        let failure = &result.errors[0];
        assert_eq!(failure.index, Some(1));
        assert_eq!(failure.kind, FailureKind::Execution);
        assert_eq!(failure.action, Some(Action::click("#missing")));
        assert!(failure.error.as_deref().unwrap().contains("#missing"));
    }
}
