//! Action planning: page summary + instruction in, canonical actions out.

pub mod extract;
pub mod normalize;
pub mod prompt;
pub mod types;

pub use extract::extract_json_array;
pub use normalize::{normalize, normalize_all};
pub use prompt::{SYSTEM_PROMPT, build_planning_prompt};
pub use types::{Action, ActionKind, Plan, PlanFailure};

use tracing::{debug, error, warn};

use crate::llm::LlmBackend;
use crate::snapshot::ElementSummary;

/// Raw-text prefix standing in for the model's answer when the call itself failed
pub const LLM_CALL_ERROR_SENTINEL: &str = "__LLM_CALL_ERROR__";

/// Plans actions for one instruction using a language model
pub struct ActionPlanner<B: LlmBackend> {
    backend: B,
}

impl<B: LlmBackend> ActionPlanner<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ask the model for a plan.
    ///
    /// Never fails: transport errors and unparseable answers both come back as a
    /// single `explain` action, with [`Plan::failure`] telling them apart.
    pub fn plan(&self, page_summary: &[ElementSummary], instruction: &str) -> Plan {
        let prompt = build_planning_prompt(page_summary, instruction);

        let raw = match self.backend.complete(&prompt) {
            Ok(text) => text,
            Err(e) => {
                error!("[LLM] call failed: {}", e);
                // Error bodies can contain JSON arrays; never plan from them.
                return Plan {
                    actions: vec![Action::explain(format!("{} {}", LLM_CALL_ERROR_SENTINEL, e))],
                    failure: Some(PlanFailure::Transport(e.to_string())),
                };
            }
        };
        debug!("[LLM] raw response: {}", raw);

        match extract_json_array(&raw) {
            Some(parsed) => Plan {
                actions: normalize_all(&parsed),
                failure: None,
            },
            None => {
                warn!("[LLM] no JSON action array in model output");
                Plan {
                    actions: vec![Action::explain(raw)],
                    failure: Some(PlanFailure::Parse(
                        "no JSON action array in model output".to_string(),
                    )),
                }
            }
        }
    }
}
