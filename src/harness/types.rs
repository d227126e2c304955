use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::browser::BrowserError;
use crate::config::{Config, DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_REPORT_FILE, DEFAULT_TESTCASES_DIR};

/// One natural-language test loaded from disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// File stem, e.g. "login" for `login.txt`
    pub name: String,

    /// Trimmed file contents, used as the instruction
    pub content: String,
}

/// Configuration for a suite run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory scanned for `*.txt` test cases
    pub testcases_dir: PathBuf,

    /// Storage state to restore; ignored when the file does not exist
    pub storage_state: Option<PathBuf>,

    /// Where the JSON report is written
    pub report_file: PathBuf,

    /// Directory for `storage_state_<timestamp>.json` saved after the run
    pub state_dir: PathBuf,

    /// Capture a screenshot here for every failed test
    pub screenshot_dir: Option<PathBuf>,

    /// Wait for Enter before running tests
    pub manual_login: bool,

    /// Visibility wait for each browser action
    pub action_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            testcases_dir: PathBuf::from(DEFAULT_TESTCASES_DIR),
            storage_state: None,
            report_file: PathBuf::from(DEFAULT_REPORT_FILE),
            state_dir: PathBuf::from("."),
            screenshot_dir: None,
            manual_login: false,
            action_timeout: Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS),
        }
    }
}

impl HarnessConfig {
    /// Seed from the environment-derived configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            testcases_dir: PathBuf::from(&config.run.testcases_dir),
            report_file: PathBuf::from(&config.run.report_file),
            action_timeout: Duration::from_millis(config.browser.action_timeout_ms),
            ..Self::default()
        }
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error types for harness operations
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The test case directory is missing or not a directory
    #[error("test case directory not found: {}", .0.display())]
    TestcasesDir(PathBuf),

    /// Browser could not be started or became unusable
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
