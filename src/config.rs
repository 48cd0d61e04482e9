//! Configuration loading with env-var overrides.
//!
//! Reads the TOML file named by `ORCHESTRATOR_CONFIG`, else
//! `config/default.toml` relative to the current working directory, else a
//! hardcoded default identical to the shipped file. Then applies the
//! `ORCHESTRATOR_LOG_LEVEL`, `ORCHESTRATOR_BIND` and `MOCK_BACKEND_BIND` env
//! overrides. The LLM API key comes from `OPENAI_API_KEY` only, never TOML.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;
use crate::registry::ApiEntry;

/// Env var naming the LLM API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// HTTP listener settings for the chat service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the `/chat` listener binds to.
    pub bind: String,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"openai"` or `"dummy"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
    /// Canned reply for the dummy provider (`[llm.dummy] reply`); echo when unset.
    pub dummy_reply: Option<String>,
}

/// API selection step.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub temperature: f32,
}

/// Answer rephrasing step.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub temperature: f32,
    /// Answer with a generic message plus the raw data when the LLM call
    /// fails, instead of a 502.
    pub fallback_on_error: bool,
}

/// Downstream fetch settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Query parameter carrying the subject identifier.
    pub query_param: String,
    /// Identifier used when the request body carries none.
    pub default_subject_id: String,
    /// Per-call timeout; `None` waits indefinitely.
    pub timeout_seconds: Option<u64>,
}

/// Mock backend listener settings.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub bind: String,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    /// API key from `OPENAI_API_KEY` — `None` when unset. Not validated here;
    /// a missing key surfaces as LLM call errors.
    pub llm_api_key: Option<String>,
    pub router: RouterConfig,
    pub summarizer: SummarizerConfig,
    pub fetch: FetchConfig,
    pub mock: MockConfig,
    /// Downstream APIs, in declaration order. Names are unique.
    pub apis: Vec<ApiEntry>,
    /// Directory holding prompt template overrides.
    pub prompts_dir: PathBuf,
}

/// Env-sourced overrides, gathered once so tests can pass them explicitly.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub bind: Option<String>,
    pub mock_bind: Option<String>,
    pub api_key: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("ORCHESTRATOR_LOG_LEVEL").ok(),
            bind: env::var("ORCHESTRATOR_BIND").ok(),
            mock_bind: env::var("MOCK_BACKEND_BIND").ok(),
            api_key: env::var(API_KEY_ENV).ok(),
        }
    }
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    router: RawRouter,
    #[serde(default)]
    summarizer: RawSummarizer,
    #[serde(default)]
    fetch: RawFetch,
    #[serde(default)]
    mock: RawMock,
    #[serde(default)]
    registry: RawRegistry,
    #[serde(default)]
    prompts: RawPrompts,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { bind: default_bind(), log_level: default_log_level() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
    #[serde(default)]
    dummy: RawDummy,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            openai: RawOpenAiConfig::default(),
            dummy: RawDummy::default(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawDummy {
    #[serde(default)]
    reply: Option<String>,
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawRouter {
    #[serde(default)]
    temperature: f32,
}

impl Default for RawRouter {
    fn default() -> Self {
        Self { temperature: 0.0 }
    }
}

#[derive(Deserialize)]
struct RawSummarizer {
    #[serde(default = "default_summarizer_temperature")]
    temperature: f32,
    #[serde(default = "default_true")]
    fallback_on_error: bool,
}

impl Default for RawSummarizer {
    fn default() -> Self {
        Self { temperature: default_summarizer_temperature(), fallback_on_error: true }
    }
}

#[derive(Deserialize)]
struct RawFetch {
    #[serde(default = "default_query_param")]
    query_param: String,
    #[serde(default = "default_subject_id")]
    default_subject_id: String,
    /// `0` disables the timeout.
    #[serde(default = "default_fetch_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawFetch {
    fn default() -> Self {
        Self {
            query_param: default_query_param(),
            default_subject_id: default_subject_id(),
            timeout_seconds: default_fetch_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawMock {
    #[serde(default = "default_mock_bind")]
    bind: String,
}

impl Default for RawMock {
    fn default() -> Self {
        Self { bind: default_mock_bind() }
    }
}

#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default = "default_apis")]
    apis: Vec<RawApi>,
}

impl Default for RawRegistry {
    fn default() -> Self {
        Self { apis: default_apis() }
    }
}

#[derive(Deserialize)]
struct RawApi {
    name: String,
    url: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct RawPrompts {
    #[serde(default = "default_prompts_dir")]
    dir: String,
}

impl Default for RawPrompts {
    fn default() -> Self {
        Self { dir: default_prompts_dir() }
    }
}

fn default_bind() -> String { "127.0.0.1:8000".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_llm_provider() -> String { "openai".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_timeout_seconds() -> u64 { 60 }
fn default_summarizer_temperature() -> f32 { 0.5 }
fn default_query_param() -> String { "patientId".to_string() }
fn default_subject_id() -> String { "123".to_string() }
fn default_fetch_timeout_seconds() -> u64 { 30 }
fn default_mock_bind() -> String { "127.0.0.1:8001".to_string() }
fn default_prompts_dir() -> String { "config/prompts".to_string() }

fn default_true() -> bool {
    true
}

fn default_apis() -> Vec<RawApi> {
    [
        ("OrderAPI", "http://localhost:8001/order", "Fetch order details"),
        ("PaymentAPI", "http://localhost:8001/payment", "Fetch payment info"),
        ("PatientAPI", "http://localhost:8001/patient", "Fetch patient details"),
        ("LabAPI", "http://localhost:8001/lab", "Fetch lab test results"),
    ]
    .into_iter()
    .map(|(name, url, description)| RawApi {
        name: name.to_string(),
        url: url.to_string(),
        description: description.to_string(),
    })
    .collect()
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `ORCHESTRATOR_CONFIG` or `config/default.toml`, then apply
/// env-var overrides. Falls back to the built-in defaults when no file exists.
pub fn load() -> Result<Config, AppError> {
    let overrides = Overrides::from_env();

    if let Ok(path) = env::var("ORCHESTRATOR_CONFIG") {
        return load_from(Path::new(&path), overrides);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(default_path, overrides)
    } else {
        resolve(RawConfig::default(), overrides)
    }
}

/// Internal loader — accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: Overrides) -> Result<Config, AppError> {
    let log_level = overrides.log_level.unwrap_or(parsed.server.log_level);
    logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("[server] log_level: {e}")))?;

    let apis = validate_apis(parsed.registry.apis)?;

    Ok(Config {
        log_level,
        server: ServerConfig {
            bind: overrides.bind.unwrap_or(parsed.server.bind),
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
            dummy_reply: parsed.llm.dummy.reply,
        },
        llm_api_key: overrides.api_key.filter(|k| !k.is_empty()),
        router: RouterConfig { temperature: parsed.router.temperature },
        summarizer: SummarizerConfig {
            temperature: parsed.summarizer.temperature,
            fallback_on_error: parsed.summarizer.fallback_on_error,
        },
        fetch: FetchConfig {
            query_param: parsed.fetch.query_param,
            default_subject_id: parsed.fetch.default_subject_id,
            timeout_seconds: Some(parsed.fetch.timeout_seconds).filter(|s| *s > 0),
        },
        mock: MockConfig {
            bind: overrides.mock_bind.unwrap_or(parsed.mock.bind),
        },
        apis,
        prompts_dir: PathBuf::from(parsed.prompts.dir),
    })
}

/// Registry entries must have non-empty, unique names.
fn validate_apis(raw: Vec<RawApi>) -> Result<Vec<ApiEntry>, AppError> {
    let mut seen = HashSet::new();
    let mut apis = Vec::with_capacity(raw.len());
    for api in raw {
        if api.name.trim().is_empty() {
            return Err(AppError::Config(format!(
                "registry entry with url '{}' has an empty name",
                api.url
            )));
        }
        if !seen.insert(api.name.clone()) {
            return Err(AppError::Config(format!(
                "duplicate registry entry name: '{}'",
                api.name
            )));
        }
        apis.push(ApiEntry {
            name: api.name,
            url: api.url,
            description: api.description,
        });
    }
    Ok(apis)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Built-in defaults with no env lookups — dummy LLM, no API key.
    /// Used by tests to build an orchestrator without touching the filesystem.
    pub fn test_default() -> Self {
        let mut cfg = resolve(RawConfig::default(), Overrides::default())
            .unwrap_or_else(|e| panic!("built-in defaults must resolve: {e}"));
        cfg.llm.provider = "dummy".into();
        cfg
    }
}
