use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::pipeline::ReductionFailurePolicy;
use crate::retry::RetryPolicy;
use crate::template::{PromptTemplate, TemplateResolver};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Settings shared by every entry point that runs the extraction pipeline.
///
/// The LLM API key is deliberately absent: callers supply it per extraction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub model: String,
    pub base_url: String,
    pub fetch_timeout: Duration,
    pub llm_timeout: Duration,
    pub fetch_max_attempts: u32,
    pub llm_max_attempts: u32,
    pub block_private_urls: bool,
    pub normalize_output: bool,
    pub on_reduction_failure: ReductionFailurePolicy,
    /// Template reference (`name@version`, `name@latest`, or a file path).
    pub prompt_template: Option<String>,
    pub templates_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            fetch_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(120),
            fetch_max_attempts: 1,
            llm_max_attempts: 1,
            block_private_urls: false,
            normalize_output: false,
            on_reduction_failure: ReductionFailurePolicy::Abort,
            prompt_template: None,
            templates_dir: PathBuf::from("templates"),
        }
    }
}

impl PipelineConfig {
    /// Read configuration from environment variables.
    ///
    /// - `PRODEX_MODEL` (default `gpt-4`)
    /// - `PRODEX_BASE_URL` (default `https://api.openai.com/v1`)
    /// - `PRODEX_FETCH_TIMEOUT_SECS` / `PRODEX_LLM_TIMEOUT_SECS` (30 / 120)
    /// - `PRODEX_FETCH_MAX_ATTEMPTS` / `PRODEX_LLM_MAX_ATTEMPTS` (1 / 1)
    /// - `PRODEX_BLOCK_PRIVATE_URLS` (false)
    /// - `PRODEX_NORMALIZE_OUTPUT` (false)
    /// - `PRODEX_ON_REDUCTION_FAILURE` (`abort` or `proceed`)
    /// - `PRODEX_PROMPT_TEMPLATE` (optional)
    /// - `PRODEX_TEMPLATES_DIR` (default `templates`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            model: lookup("PRODEX_MODEL").unwrap_or(defaults.model),
            base_url: lookup("PRODEX_BASE_URL").unwrap_or(defaults.base_url),
            fetch_timeout: parse_var(&lookup, "PRODEX_FETCH_TIMEOUT_SECS", 30, positive)
                .map(Duration::from_secs)?,
            llm_timeout: parse_var(&lookup, "PRODEX_LLM_TIMEOUT_SECS", 120, positive)
                .map(Duration::from_secs)?,
            fetch_max_attempts: parse_var(&lookup, "PRODEX_FETCH_MAX_ATTEMPTS", 1, positive)?,
            llm_max_attempts: parse_var(&lookup, "PRODEX_LLM_MAX_ATTEMPTS", 1, positive)?,
            block_private_urls: parse_flag(&lookup, "PRODEX_BLOCK_PRIVATE_URLS")?,
            normalize_output: parse_flag(&lookup, "PRODEX_NORMALIZE_OUTPUT")?,
            on_reduction_failure: match lookup("PRODEX_ON_REDUCTION_FAILURE") {
                None => defaults.on_reduction_failure,
                Some(raw) => raw.parse().map_err(|e: String| {
                    AppError::ConfigError(format!("Invalid PRODEX_ON_REDUCTION_FAILURE: {e}"))
                })?,
            },
            prompt_template: lookup("PRODEX_PROMPT_TEMPLATE").filter(|s| !s.trim().is_empty()),
            templates_dir: lookup("PRODEX_TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.templates_dir),
        })
    }

    pub fn fetch_policy(&self) -> RetryPolicy {
        RetryPolicy::single_attempt(self.fetch_timeout).with_max_attempts(self.fetch_max_attempts)
    }

    pub fn completion_policy(&self) -> RetryPolicy {
        RetryPolicy::single_attempt(self.llm_timeout).with_max_attempts(self.llm_max_attempts)
    }

    /// Load the configured prompt template, or the built-in one.
    pub fn load_template(&self) -> Result<PromptTemplate, AppError> {
        match &self.prompt_template {
            None => Ok(PromptTemplate::builtin()),
            Some(template_ref) => TemplateResolver::new(&self.templates_dir).resolve(template_ref),
        }
    }
}

fn positive<T: PartialOrd + Default>(value: &T) -> bool {
    *value > T::default()
}

fn parse_var<L, T>(lookup: &L, key: &str, default: T, valid: fn(&T) -> bool) -> Result<T, AppError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => Ok(value),
        _ => Err(AppError::ConfigError(format!(
            "Invalid {key} '{raw}': must be a positive integer"
        ))),
    }
}

fn parse_flag<L>(lookup: &L, key: &str) -> Result<bool, AppError>
where
    L: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(AppError::ConfigError(format!(
            "Invalid {key} '{other}': expected true or false"
        ))),
    }
}
