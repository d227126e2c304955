use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use browser_pilot::browser::WebDriverPage;
use browser_pilot::config::{self, BrowserKind, LlmBackendKind, LlmSettings};
use browser_pilot::harness::{HarnessConfig, run_suite};
use browser_pilot::llm::{ChatCompletionsClient, LlmBackend};
use browser_pilot::planner::ActionPlanner;
use browser_pilot::{LlmAgent, TestStatus};

/// Browser Pilot - natural-language browser tests planned by an LLM
#[derive(Parser, Debug)]
#[command(
    name = "browser-pilot",
    about = "Run plain-English browser tests: an LLM plans the actions, WebDriver executes them",
    after_help = "ENVIRONMENT VARIABLES:\n\
        BROWSER_PILOT_LLM_BACKEND        groq, openai or ollama\n\
        BROWSER_PILOT_LLM_ENDPOINT       Chat-completions endpoint URL\n\
        BROWSER_PILOT_LLM_MODEL          Model name (GROQ_MODEL also honored)\n\
        BROWSER_PILOT_LLM_TIMEOUT        LLM request timeout (seconds)\n\
        GROQ_API_KEY / OPENAI_API_KEY    API keys\n\
        BROWSER_PILOT_WEBDRIVER_URL      WebDriver server URL\n\
        BROWSER_PILOT_BROWSER            chrome or firefox\n\
        BROWSER_PILOT_ACTION_TIMEOUT_MS  Per-action visibility wait\n\
        BROWSER_PILOT_TESTCASES_DIR      Test case directory\n\
        BROWSER_PILOT_REPORT_FILE        Report path\n\
        RUST_LOG                         Log filter (default: info)"
)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every test case in a directory and write a JSON report
    Run {
        /// Directory containing .txt test files
        #[arg(short, long)]
        testcases_dir: Option<PathBuf>,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        /// Storage state JSON to restore (cookies, localStorage)
        #[arg(long)]
        storage_state: Option<PathBuf>,

        /// Model name override
        #[arg(short, long)]
        model_name: Option<String>,

        /// Where to write the JSON report
        #[arg(short, long)]
        report_file: Option<PathBuf>,

        /// LLM backend: groq, openai or ollama
        #[arg(long)]
        backend: Option<LlmBackendKind>,

        /// WebDriver server URL
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Browser: chrome or firefox
        #[arg(long)]
        browser: Option<BrowserKind>,

        /// Per-action visibility wait in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Save a screenshot of every failed test into this directory
        #[arg(long)]
        screenshot_dir: Option<PathBuf>,

        /// Directory for the storage state saved after the run
        #[arg(long, default_value = ".")]
        state_dir: PathBuf,

        /// Pause for a manual login before running tests
        #[arg(long)]
        manual_login: bool,
    },

    /// Plan a single test case without a browser and print the actions
    Plan {
        /// Test case file
        file: PathBuf,

        /// Model name override
        #[arg(short, long)]
        model_name: Option<String>,

        /// LLM backend: groq, openai or ollama
        #[arg(long)]
        backend: Option<LlmBackendKind>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    let config = config::get().map_err(|e| e.to_string())?;

    match args.command {
        Some(Commands::Run {
            testcases_dir,
            headless,
            storage_state,
            model_name,
            report_file,
            backend,
            webdriver_url,
            browser,
            timeout_ms,
            screenshot_dir,
            state_dir,
            manual_login,
        }) => {
            let llm = llm_settings(&config.llm, backend, model_name);
            let mut browser_settings = config.browser.clone();
            browser_settings.headless = headless;
            if let Some(url) = webdriver_url {
                browser_settings.webdriver_url = url;
            }
            if let Some(kind) = browser {
                browser_settings.browser = kind;
            }
            if let Some(ms) = timeout_ms {
                browser_settings.action_timeout_ms = ms;
            }

            let mut harness = HarnessConfig::from_config(config);
            if let Some(dir) = testcases_dir {
                harness.testcases_dir = dir;
            }
            if let Some(path) = report_file {
                harness.report_file = path;
            }
            harness.storage_state = storage_state;
            harness.screenshot_dir = screenshot_dir;
            harness.state_dir = state_dir;
            harness.manual_login = manual_login;
            harness.action_timeout = Duration::from_millis(browser_settings.action_timeout_ms);

            info!("Headless mode: {}", browser_settings.headless);
            info!(
                "Storage state: {}",
                harness
                    .storage_state
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string())
            );

            let agent = LlmAgent::new(ChatCompletionsClient::new(llm)?);
            let results = run_suite(
                &harness,
                &agent,
                || WebDriverPage::connect(&browser_settings),
                &mut std::io::stdin().lock(),
            )?;

            let failed = results.iter().filter(|r| r.status == TestStatus::Failed).count();
            println!(
                "{} tests: {} passed, {} failed. Report: {}",
                results.len(),
                results.len() - failed,
                failed,
                harness.report_file.display()
            );
        }

        Some(Commands::Plan {
            file,
            model_name,
            backend,
        }) => {
            let instruction = std::fs::read_to_string(&file)?.trim().to_string();
            let client = ChatCompletionsClient::new(llm_settings(&config.llm, backend, model_name))?;
            info!("Planning {} with {}", file.display(), client.model());

            let plan = ActionPlanner::new(client).plan(&[], &instruction);
            if let Some(failure) = &plan.failure {
                warn!("Planning fell back to an explain step: {:?}", failure);
            }
            println!("{}", serde_json::to_string_pretty(&plan.actions)?);
        }

        None => {
            println!("Browser Pilot - natural-language browser tests planned by an LLM");
            println!();
            println!("Usage: browser-pilot <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run   Run every test case in a directory and write a JSON report");
            println!("  plan  Plan a single test case without a browser");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

/// Apply CLI overrides; switching backend re-reads that backend's key
fn llm_settings(base: &LlmSettings, backend: Option<LlmBackendKind>, model: Option<String>) -> LlmSettings {
    let mut settings = match backend {
        Some(kind) if kind != base.backend => {
            let mut settings = LlmSettings::for_backend(kind);
            settings.timeout_secs = base.timeout_secs;
            settings.api_key = kind
                .api_key_variable()
                .and_then(|variable| std::env::var(variable).ok())
                .filter(|key| !key.trim().is_empty());
            settings
        }
        _ => base.clone(),
    };
    if let Some(model) = model {
        settings = settings.model(model);
    }
    settings
}
