//! Types for test run results and the persisted run report.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::planner::{Action, PlanFailure};

/// Outcome of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Ok,
    Failed,
}

/// What kind of problem a failure record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The page could not be described to the model
    Summary,
    /// The plan contained an `explain` step (including planning fallbacks)
    Explain,
    /// The action kind is not one the executor knows
    UnknownAction,
    /// A browser action arrived without a selector
    MissingSelector,
    /// The browser operation itself failed
    Execution,
    /// The test could not run at all
    Fatal,
}

/// One failure recorded during a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionFailure {
    pub kind: FailureKind,

    /// Position of the action in the plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// The offending action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    /// Diagnostic text for non-exceptional failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Error text from the browser layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a complete test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name (file stem), set by the harness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,

    /// Natural-language instruction that was planned
    pub instruction: String,

    /// Actions as planned and normalized
    pub actions: Vec<Action>,

    pub status: TestStatus,

    /// Failures in the order they happened
    pub errors: Vec<ActionFailure>,

    /// Why planning fell back to an explain step, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_failure: Option<PlanFailure>,
}

impl TestResult {
    /// Start a result for `instruction`; status is ok until a failure is recorded
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            test_name: None,
            instruction: instruction.into(),
            actions: Vec::new(),
            status: TestStatus::Ok,
            errors: Vec::new(),
            plan_failure: None,
        }
    }

    /// A result for a test that could not run
    pub fn fatal(instruction: impl Into<String>, error: impl std::fmt::Display) -> Self {
        let mut result = Self::new(instruction);
        result.record(ActionFailure {
            kind: FailureKind::Fatal,
            index: None,
            action: None,
            message: None,
            error: Some(error.to_string()),
        });
        result
    }

    /// Append a failure; the test is failed from here on
    pub fn record(&mut self, failure: ActionFailure) {
        self.errors.push(failure);
        self.status = TestStatus::Failed;
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = Some(name.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == TestStatus::Ok
    }
}

/// Write the run report as a pretty JSON array
pub fn write_report(path: &Path, results: &[TestResult]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(results)?)
}

/// Read a run report back
pub fn read_report(path: &Path) -> std::io::Result<Vec<TestResult>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_flips_status() {
        let mut result = TestResult::new("open the homepage");
        assert!(result.is_ok());
        result.record(ActionFailure {
            kind: FailureKind::Explain,
            index: Some(0),
            action: Some(Action::explain("nothing to do")),
            message: Some("nothing to do".into()),
            error: None,
        });
        assert_eq!(result.status, TestStatus::Failed);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let result = TestResult::fatal("x", "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["errors"][0]["kind"], "fatal");
        assert_eq!(json["errors"][0]["error"], "boom");
        assert!(json.get("test_name").is_none());
    }
}
