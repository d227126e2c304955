//! One test case end to end: describe the page, plan, execute.

use tracing::{info, warn};

use crate::browser::{BrowserResult, PageDriver};
use crate::executor::execute_actions;
use crate::llm::LlmBackend;
use crate::planner::ActionPlanner;
use crate::runner::{ActionFailure, FailureKind, TestResult};
use crate::session::BrowserSession;

/// Drives a single instruction through the summarize/plan/execute pipeline
pub struct LlmAgent<B: LlmBackend> {
    planner: ActionPlanner<B>,
}

impl<B: LlmBackend> LlmAgent<B> {
    pub fn new(backend: B) -> Self {
        Self {
            planner: ActionPlanner::new(backend),
        }
    }

    pub fn planner(&self) -> &ActionPlanner<B> {
        &self.planner
    }

    /// Run `instruction` against whatever page the session is showing.
    ///
    /// A page that cannot be described is recorded and planning continues with
    /// an empty summary. Only a missing browser aborts the test.
    pub fn execute_test<D: PageDriver>(
        &self,
        session: &mut BrowserSession<D>,
        instruction: &str,
    ) -> BrowserResult<TestResult> {
        info!("Executing test instruction: {}", instruction);
        let mut result = TestResult::new(instruction);

        let summary = match session.describe_page() {
            Ok(summary) => summary,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Could not describe page: {}", e);
                result.record(ActionFailure {
                    kind: FailureKind::Summary,
                    index: None,
                    action: None,
                    message: Some("page summary failed".to_string()),
                    error: Some(e.to_string()),
                });
                Vec::new()
            }
        };

        let plan = self.planner.plan(&summary, instruction);
        info!("Planned {} actions", plan.actions.len());
        result.plan_failure = plan.failure;

        execute_actions(session, &plan.actions, &mut result)?;
        result.actions = plan.actions;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockDriver, MockPage};
    use crate::llm::{LlmError, LlmResult};
    use crate::planner::{ActionKind, PlanFailure};
    use crate::runner::TestStatus;
    use std::cell::RefCell;

    struct Scripted {
        replies: RefCell<Vec<LlmResult<String>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<LlmResult<String>>) -> Self {
            Self {
                replies: RefCell::new(replies),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl LlmBackend for Scripted {
        fn complete(&self, prompt: &str) -> LlmResult<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.replies.borrow_mut().remove(0)
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    const URL: &str = "https://example.com/";

    fn session() -> BrowserSession<MockDriver> {
        let page = MockPage::new().target("h1", "Example Domain");
        BrowserSession::with_driver(MockDriver::new().page(URL, page))
    }

    #[test]
    fn test_successful_test() {
        let reply = r#"[{"action":"open","selector":"https://example.com/"},{"action":"assert","selector":"h1","expected":"Example"}]"#;
        let agent = LlmAgent::new(Scripted::new(vec![Ok(reply.to_string())]));
        let mut session = session();

        let result = agent.execute_test(&mut session, "check the heading").unwrap();
        assert_eq!(result.status, TestStatus::Ok);
        assert_eq!(result.actions.len(), 2);
        assert_eq!(result.plan_failure, None);
    }

    #[test]
    fn test_transport_failure_becomes_explain() {
        let agent = LlmAgent::new(Scripted::new(vec![Err(LlmError::RateLimited)]));
        let mut session = session();

        let result = agent.execute_test(&mut session, "anything").unwrap();
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.actions.len(), 1);
        assert_eq!(result.actions[0].kind, Some(ActionKind::Explain));
        assert!(result.actions[0]
            .message
            .as_deref()
            .unwrap()
            .starts_with(crate::planner::LLM_CALL_ERROR_SENTINEL));
        assert!(matches!(result.plan_failure, Some(PlanFailure::Transport(_))));
    }

    #[test]
    fn test_prompt_carries_instruction() {
        let agent = LlmAgent::new(Scripted::new(vec![Ok("[]".to_string())]));
        let mut session = session();
        let result = agent.execute_test(&mut session, "click the login button").unwrap();

        let prompts = agent.planner().backend().prompts.borrow();
        assert!(prompts[0].contains("Instruction:\nclick the login button"));
        assert!(matches!(result.plan_failure, Some(PlanFailure::Parse(_))));
    }

    #[test]
    fn test_unlaunched_session_is_fatal() {
        let agent = LlmAgent::new(Scripted::new(vec![Ok(r##"[{"click":"#go"}]"##.to_string())]));
        let mut session: BrowserSession<MockDriver> = BrowserSession::new();
        assert!(agent.execute_test(&mut session, "x").unwrap_err().is_fatal());
    }
}
