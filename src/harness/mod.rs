pub mod suite;
pub mod types;

pub use suite::{load_testcases, run_suite};
pub use types::{HarnessConfig, HarnessError, HarnessResult, TestCase};
