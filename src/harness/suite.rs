use chrono::Local;
use std::fs;
use std::io::BufRead;
use std::path::Path;
use tracing::{error, info, warn};

use crate::agent::LlmAgent;
use crate::browser::{BrowserResult, PageDriver};
use crate::harness::types::{HarnessConfig, HarnessError, HarnessResult, TestCase};
use crate::llm::LlmBackend;
use crate::runner::{TestResult, write_report};
use crate::session::BrowserSession;

/// Load every `*.txt` file in `dir`, sorted by path
pub fn load_testcases(dir: &Path) -> HarnessResult<Vec<TestCase>> {
    if !dir.is_dir() {
        return Err(HarnessError::TestcasesDir(dir.to_path_buf()));
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path)?.trim().to_string();
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(TestCase { name, content })
        })
        .collect()
}

/// Run every test case in `config.testcases_dir` in one browser session.
///
/// `launch` starts the driver. The browser is closed and the report written
/// whatever happens; the returned error, if any, is what stopped the run early.
pub fn run_suite<B, D, L>(
    config: &HarnessConfig,
    agent: &LlmAgent<B>,
    launch: L,
    input: &mut impl BufRead,
) -> HarnessResult<Vec<TestResult>>
where
    B: LlmBackend,
    D: PageDriver,
    L: FnOnce() -> BrowserResult<D>,
{
    info!("=== Starting LLM browser automation run ===");
    info!("Test cases directory: {}", config.testcases_dir.display());
    info!("Using model: {}", agent.planner().backend().model());

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut session = BrowserSession::new().action_timeout(config.action_timeout);
    let mut results = Vec::new();

    let outcome = run_tests(config, agent, &mut session, launch, input, &timestamp, &mut results);
    if let Err(e) = &outcome {
        error!("Run aborted: {}", e);
    }

    if let Err(e) = session.close() {
        warn!("Failed to close browser: {}", e);
    }

    match write_report(&config.report_file, &results) {
        Ok(()) => info!("Test results saved to {}", config.report_file.display()),
        Err(e) => warn!("Failed to write test report: {}", e),
    }

    info!("=== Test run complete ===");
    outcome.map(|_| results)
}

fn run_tests<B, D, L>(
    config: &HarnessConfig,
    agent: &LlmAgent<B>,
    session: &mut BrowserSession<D>,
    launch: L,
    input: &mut impl BufRead,
    timestamp: &str,
    results: &mut Vec<TestResult>,
) -> HarnessResult<()>
where
    B: LlmBackend,
    D: PageDriver,
    L: FnOnce() -> BrowserResult<D>,
{
    session.launch(launch()?);

    let storage_state = config.storage_state.as_deref().filter(|path| path.exists());
    session.new_context(storage_state)?;

    if config.manual_login {
        session.pause_for_manual_login(input)?;
    }

    let tests = load_testcases(&config.testcases_dir)?;
    if tests.is_empty() {
        warn!("No test cases found in directory: {}", config.testcases_dir.display());
        return Ok(());
    }

    for test in &tests {
        info!("=== Running test: {} ===", test.name);
        let result = match agent.execute_test(session, &test.content) {
            Ok(result) => result.with_name(&test.name),
            Err(e) => {
                error!("Error running test '{}': {}", test.name, e);
                TestResult::fatal(&test.content, &e).with_name(&test.name)
            }
        };
        info!("Test '{}' completed with status: {:?}", test.name, result.status);

        if !result.is_ok() {
            if let Some(dir) = &config.screenshot_dir {
                capture_failure(session, dir, &test.name, timestamp);
            }
        }
        results.push(result);
    }

    let state_path = config.state_dir.join(format!("storage_state_{}.json", timestamp));
    if let Err(e) = session.save_storage_state(&state_path) {
        warn!("Could not save storage state: {}", e);
    }
    Ok(())
}

fn capture_failure<D: PageDriver>(session: &BrowserSession<D>, dir: &Path, name: &str, timestamp: &str) {
    if let Err(e) = fs::create_dir_all(dir) {
        warn!("Could not create screenshot directory {}: {}", dir.display(), e);
        return;
    }
    let path = dir.join(format!("{}_{}.png", name, timestamp));
    if let Err(e) = session.save_screenshot(&path) {
        warn!("Could not capture failure screenshot for '{}': {}", name, e);
    }
}
