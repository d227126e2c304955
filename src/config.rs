//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for browser-pilot, supporting:
//! - Environment variables for all configurable values (a `.env` file is loaded by the binary)
//! - An explicit backend enum for LLM provider selection
//! - Builder-style overrides from CLI flags
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BROWSER_PILOT_LLM_BACKEND` | LLM backend: `groq`, `openai`, `ollama` | `groq` |
//! | `BROWSER_PILOT_LLM_ENDPOINT` | Chat-completions endpoint URL | per backend |
//! | `BROWSER_PILOT_LLM_MODEL` | Model name (falls back to `GROQ_MODEL`) | per backend |
//! | `BROWSER_PILOT_LLM_TIMEOUT` | LLM request timeout (seconds) | `120` |
//! | `GROQ_API_KEY` | API key for the Groq backend | none |
//! | `OPENAI_API_KEY` | API key for the OpenAI backend | none |
//! | `BROWSER_PILOT_WEBDRIVER_URL` | WebDriver server URL | `http://localhost:9515` |
//! | `BROWSER_PILOT_BROWSER` | Browser: `chrome` or `firefox` | `chrome` |
//! | `BROWSER_PILOT_ACTION_TIMEOUT_MS` | Per-action visibility wait (ms) | `5000` |
//! | `BROWSER_PILOT_TESTCASES_DIR` | Directory with `.txt` test cases | `testcases` |
//! | `BROWSER_PILOT_REPORT_FILE` | Where the JSON run report is written | `run_report.json` |
//!
//! # Example
//!
//! ```bash
//! # Use a local Ollama model instead of Groq
//! export BROWSER_PILOT_LLM_BACKEND=ollama
//! export BROWSER_PILOT_LLM_MODEL=llama3.1
//!
//! # Drive Firefox through geckodriver
//! export BROWSER_PILOT_BROWSER=firefox
//! export BROWSER_PILOT_WEBDRIVER_URL=http://localhost:4444
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default Groq chat-completions endpoint
pub const DEFAULT_GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default OpenAI chat-completions endpoint
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default Ollama (OpenAI-compatible) chat-completions endpoint
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://127.0.0.1:11434/v1/chat/completions";

/// Default Groq model
pub const DEFAULT_GROQ_MODEL: &str = "gpt-oss-20b";

/// Default OpenAI model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default Ollama model
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Default LLM request timeout (seconds)
pub const DEFAULT_LLM_TIMEOUT: u64 = 120;

/// Default WebDriver server (chromedriver's default port)
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Default per-action visibility wait (milliseconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5000;

/// Default test case directory
pub const DEFAULT_TESTCASES_DIR: &str = "testcases";

/// Default report path
pub const DEFAULT_REPORT_FILE: &str = "run_report.json";

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_LLM_BACKEND: &str = "BROWSER_PILOT_LLM_BACKEND";
pub const ENV_LLM_ENDPOINT: &str = "BROWSER_PILOT_LLM_ENDPOINT";
pub const ENV_LLM_MODEL: &str = "BROWSER_PILOT_LLM_MODEL";
pub const ENV_LLM_TIMEOUT: &str = "BROWSER_PILOT_LLM_TIMEOUT";
pub const ENV_WEBDRIVER_URL: &str = "BROWSER_PILOT_WEBDRIVER_URL";
pub const ENV_BROWSER: &str = "BROWSER_PILOT_BROWSER";
pub const ENV_ACTION_TIMEOUT_MS: &str = "BROWSER_PILOT_ACTION_TIMEOUT_MS";
pub const ENV_TESTCASES_DIR: &str = "BROWSER_PILOT_TESTCASES_DIR";
pub const ENV_REPORT_FILE: &str = "BROWSER_PILOT_REPORT_FILE";

/// Provider-native variables, honored for compatibility with existing `.env` files
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_GROQ_MODEL: &str = "GROQ_MODEL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

// ============================================================================
// Errors
// ============================================================================

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors. These are fatal: the run does not start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown LLM backend '{0}' (expected groq, openai or ollama)")]
    UnknownBackend(String),

    #[error("unknown browser '{0}' (expected chrome or firefox)")]
    UnknownBrowser(String),

    #[error("LLM backend '{backend}' requires {variable} to be set")]
    MissingApiKey {
        backend: LlmBackendKind,
        variable: &'static str,
    },

    #[error("could not build HTTP client: {0}")]
    HttpClient(String),
}

// ============================================================================
// Enums
// ============================================================================

/// Which LLM provider to talk to. All of them speak the OpenAI chat-completions dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackendKind {
    #[default]
    Groq,
    OpenAi,
    Ollama,
}

impl LlmBackendKind {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            LlmBackendKind::Groq => DEFAULT_GROQ_ENDPOINT,
            LlmBackendKind::OpenAi => DEFAULT_OPENAI_ENDPOINT,
            LlmBackendKind::Ollama => DEFAULT_OLLAMA_ENDPOINT,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            LlmBackendKind::Groq => DEFAULT_GROQ_MODEL,
            LlmBackendKind::OpenAi => DEFAULT_OPENAI_MODEL,
            LlmBackendKind::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }

    /// The variable holding this backend's API key; `None` for keyless local backends
    pub fn api_key_variable(self) -> Option<&'static str> {
        match self {
            LlmBackendKind::Groq => Some(ENV_GROQ_API_KEY),
            LlmBackendKind::OpenAi => Some(ENV_OPENAI_API_KEY),
            LlmBackendKind::Ollama => None,
        }
    }
}

impl FromStr for LlmBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(LlmBackendKind::Groq),
            "openai" => Ok(LlmBackendKind::OpenAi),
            "ollama" => Ok(LlmBackendKind::Ollama),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for LlmBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmBackendKind::Groq => "groq",
            LlmBackendKind::OpenAi => "openai",
            LlmBackendKind::Ollama => "ollama",
        };
        f.write_str(name)
    }
}

/// Browser to request from the WebDriver server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

impl FromStr for BrowserKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            other => Err(ConfigError::UnknownBrowser(other.to_string())),
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserKind::Chrome => f.write_str("chrome"),
            BrowserKind::Firefox => f.write_str("firefox"),
        }
    }
}

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<ConfigResult<Config>> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> Result<&'static Config, &'static ConfigError> {
    CONFIG.get_or_init(Config::from_env).as_ref()
}

/// Centralized configuration for browser-pilot
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM configuration
    pub llm: LlmSettings,
    /// Browser configuration
    pub browser: BrowserSettings,
    /// Test run configuration
    pub run: RunSettings,
}

/// LLM-related settings
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Selected backend
    pub backend: LlmBackendKind,
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key, if the backend needs one
    pub api_key: Option<String>,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

/// Browser-related settings
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// WebDriver server URL
    pub webdriver_url: String,
    /// Browser to launch
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Visibility wait applied to fill/click/assert/wait (milliseconds)
    pub action_timeout_ms: u64,
}

/// Test run settings
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Directory containing `.txt` test cases
    pub testcases_dir: String,
    /// Where to write the JSON report
    pub report_file: String,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            llm: LlmSettings::from_env()?,
            browser: BrowserSettings::from_env()?,
            run: RunSettings::from_env(),
        })
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            llm: LlmSettings::defaults(),
            browser: BrowserSettings::defaults(),
            run: RunSettings::defaults(),
        }
    }
}

impl LlmSettings {
    /// Create LLM settings from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let backend = match env::var(ENV_LLM_BACKEND) {
            Ok(value) => value.parse()?,
            Err(_) => LlmBackendKind::default(),
        };

        let model = env::var(ENV_LLM_MODEL)
            .ok()
            .or_else(|| match backend {
                LlmBackendKind::Groq => env::var(ENV_GROQ_MODEL).ok(),
                _ => None,
            })
            .unwrap_or_else(|| backend.default_model().to_string());

        Ok(Self {
            backend,
            endpoint: env::var(ENV_LLM_ENDPOINT)
                .unwrap_or_else(|_| backend.default_endpoint().to_string()),
            model,
            api_key: backend
                .api_key_variable()
                .and_then(|variable| env::var(variable).ok())
                .filter(|key| !key.trim().is_empty()),
            timeout_secs: parse_env(ENV_LLM_TIMEOUT).unwrap_or(DEFAULT_LLM_TIMEOUT),
        })
    }

    /// Create LLM settings with defaults
    pub fn defaults() -> Self {
        Self::for_backend(LlmBackendKind::default())
    }

    /// Defaults for a specific backend
    pub fn for_backend(backend: LlmBackendKind) -> Self {
        Self {
            backend,
            endpoint: backend.default_endpoint().to_string(),
            model: backend.default_model().to_string(),
            api_key: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT,
        }
    }

    /// Override the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// A backend that needs a key but has none cannot be used.
    pub fn validate(&self) -> ConfigResult<()> {
        match self.backend.api_key_variable() {
            Some(variable) if self.api_key.is_none() => Err(ConfigError::MissingApiKey {
                backend: self.backend,
                variable,
            }),
            _ => Ok(()),
        }
    }
}

impl BrowserSettings {
    /// Create browser settings from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let browser = match env::var(ENV_BROWSER) {
            Ok(value) => value.parse()?,
            Err(_) => BrowserKind::default(),
        };

        Ok(Self {
            webdriver_url: env::var(ENV_WEBDRIVER_URL)
                .unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string()),
            browser,
            headless: false,
            action_timeout_ms: parse_env(ENV_ACTION_TIMEOUT_MS)
                .unwrap_or(DEFAULT_ACTION_TIMEOUT_MS),
        })
    }

    /// Create browser settings with defaults
    pub fn defaults() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            browser: BrowserKind::default(),
            headless: false,
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
        }
    }
}

impl RunSettings {
    /// Create run settings from environment variables
    pub fn from_env() -> Self {
        Self {
            testcases_dir: env::var(ENV_TESTCASES_DIR)
                .unwrap_or_else(|_| DEFAULT_TESTCASES_DIR.to_string()),
            report_file: env::var(ENV_REPORT_FILE)
                .unwrap_or_else(|_| DEFAULT_REPORT_FILE.to_string()),
        }
    }

    /// Create run settings with defaults
    pub fn defaults() -> Self {
        Self {
            testcases_dir: DEFAULT_TESTCASES_DIR.to_string(),
            report_file: DEFAULT_REPORT_FILE.to_string(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Read and parse an environment variable, ignoring unset or malformed values
fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("groq".parse::<LlmBackendKind>().unwrap(), LlmBackendKind::Groq);
        assert_eq!("OpenAI".parse::<LlmBackendKind>().unwrap(), LlmBackendKind::OpenAi);
        assert_eq!(" ollama ".parse::<LlmBackendKind>().unwrap(), LlmBackendKind::Ollama);
        assert!(matches!(
            "claude".parse::<LlmBackendKind>(),
            Err(ConfigError::UnknownBackend(name)) if name == "claude"
        ));
    }

    #[test]
    fn test_browser_kind_parse() {
        assert_eq!("chromium".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert_eq!("firefox".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
        assert!("safari".parse::<BrowserKind>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.llm.backend, LlmBackendKind::Groq);
        assert_eq!(config.llm.endpoint, DEFAULT_GROQ_ENDPOINT);
        assert_eq!(config.llm.model, DEFAULT_GROQ_MODEL);
        assert_eq!(config.browser.action_timeout_ms, 5000);
        assert_eq!(config.run.report_file, DEFAULT_REPORT_FILE);
    }

    #[test]
    fn test_validate_requires_key_for_hosted_backends() {
        let settings = LlmSettings::for_backend(LlmBackendKind::Groq);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingApiKey { variable: ENV_GROQ_API_KEY, .. })
        ));
        assert!(settings.api_key("gsk_test").validate().is_ok());
    }

    #[test]
    fn test_validate_ollama_needs_no_key() {
        let settings = LlmSettings::for_backend(LlmBackendKind::Ollama).model("qwen2.5");
        assert!(settings.validate().is_ok());
        assert_eq!(settings.model, "qwen2.5");
        assert_eq!(settings.endpoint, DEFAULT_OLLAMA_ENDPOINT);
    }
}
