//! Browser Pilot - natural-language browser tests planned by an LLM.
//!
//! This crate provides:
//! - A page summarizer that turns the live DOM into a compact element list (cached per URL)
//! - An action planner that asks a chat-completions model for a JSON action list
//!   and repairs or falls back when the answer is malformed
//! - A normalizer that maps loosely shaped model output onto canonical actions
//! - An executor that runs actions with per-action failure isolation
//! - A session manager over WebDriver (plus `MockDriver` for tests)
//! - A harness that runs a directory of `.txt` test cases and writes a JSON report
//!
//! # Example
//!
//! ```rust,no_run
//! use browser_pilot::browser::WebDriverPage;
//! use browser_pilot::config::{BrowserSettings, LlmSettings};
//! use browser_pilot::llm::ChatCompletionsClient;
//! use browser_pilot::{BrowserSession, LlmAgent};
//!
//! let agent = LlmAgent::new(ChatCompletionsClient::new(LlmSettings::defaults().api_key("key")).unwrap());
//! let mut session = BrowserSession::with_driver(WebDriverPage::connect(&BrowserSettings::defaults()).unwrap());
//! let result = agent.execute_test(&mut session, "Open https://example.com and check the heading").unwrap();
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! session.close().unwrap();
//! ```

pub mod agent;
pub mod browser;
pub mod config;
pub mod executor;
pub mod harness;
pub mod llm;
pub mod planner;
pub mod runner;
pub mod session;
pub mod snapshot;

// Re-export the pipeline entry points
pub use agent::LlmAgent;
pub use executor::execute;
pub use session::BrowserSession;

// Re-export result types
pub use runner::{ActionFailure, FailureKind, TestResult, TestStatus, read_report, write_report};

// Re-export harness types
pub use harness::{HarnessConfig, HarnessError, HarnessResult, TestCase, load_testcases, run_suite};

// Re-export planning types
pub use planner::{Action, ActionKind, ActionPlanner, Plan, PlanFailure, extract_json_array, normalize};

// Re-export browser abstraction
pub use browser::{BrowserError, BrowserResult, MockDriver, PageDriver, StorageState};

// Re-export LLM client
pub use llm::{ChatCompletionsClient, LlmBackend, LlmError, LlmResult};
