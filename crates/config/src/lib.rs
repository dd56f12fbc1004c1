//! Runtime configuration for the detection engine.
//!
//! Loads from, in ascending priority:
//! - `config/default.toml`
//! - `config/{env}.toml`
//! - environment variables prefixed `VERITAS__` (double underscore
//!   separated, e.g. `VERITAS__SERVER__PORT`)
//!
//! Everything here is configuration-time: once `load_settings` returns,
//! the values (including the learning ring's `activation_threshold`
//! and `fp_limit`) are treated as immutable for the life of the
//! process.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Hard cap on request body size.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_bytes() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `RUST_LOG`-style filter directive, e.g. `info,veritas_detect=debug`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub json_logs: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json_logs: false,
        }
    }
}

/// Thresholds governing the learning ring. Configuration-time
/// constants: immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: u32,
    #[serde(default = "default_fp_limit")]
    pub fp_limit: f64,
}

fn default_activation_threshold() -> u32 {
    5
}

fn default_fp_limit() -> f64 {
    0.15
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            activation_threshold: default_activation_threshold(),
            fp_limit: default_fp_limit(),
        }
    }
}

/// Thresholds and bounds for the iterative corrector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectorConfig {
    #[serde(default = "default_correction_threshold")]
    pub score_threshold: i32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_correction_threshold() -> i32 {
    80
}

fn default_max_iterations() -> u32 {
    3
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_correction_threshold(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// The LLM circuit breaker's failure/recovery thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_recovery_timeout_secs() -> u64 {
    60
}

impl CircuitBreakerConfig {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(flatten)]
    pub circuit_breaker: CircuitBreakerConfig,
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_llm_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl LlmConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: std::env::var("VERITAS_LLM_API_KEY").ok(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_database_url")]
    pub database_url: String,
}

fn default_audit_database_url() -> String {
    "sqlite://veritas_audit.db".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            database_url: default_audit_database_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub learning: LearningConfig,
    #[serde(default)]
    pub corrector: CorrectorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.learning.fp_limit <= 0.0 || self.learning.fp_limit >= 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "learning.fp_limit".to_string(),
                message: "must be in (0, 1)".to_string(),
            });
        }
        if self.learning.activation_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "learning.activation_threshold".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.corrector.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "corrector.max_iterations".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from files and environment, in that priority order.
/// Falls back to in-code defaults when no config files are present.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));
    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }
    builder = builder.add_source(
        Environment::with_prefix("VERITAS")
            .separator("__")
            .try_parsing(true),
    );

    let built = builder.build()?;
    let settings: Settings = built.try_deserialize().unwrap_or_default();
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.learning.activation_threshold, 5);
    }

    #[test]
    fn rejects_bad_fp_limit() {
        let mut settings = Settings::default();
        settings.learning.fp_limit = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_settings_without_files_falls_back_to_defaults() {
        let settings = load_settings(None).expect("defaults should be valid");
        assert_eq!(settings.corrector.max_iterations, 3);
    }
}
