//! 网关配置：启动时解析一次，之后以只读方式注入各组件。
//!
//! Gateway configuration.
//!
//! Resolved once at process start and shared read-only (behind an `Arc`) by the
//! policy, the provider client and every route. Handlers never read the
//! environment themselves.
//!
//! Sources, later overriding earlier:
//! 1. built-in defaults
//! 2. optional YAML file
//! 3. environment variables (`STUDY_AI_*`, with `OPENAI_*` fallbacks for the
//!    key, model and organization)

use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("no upstream API key configured (set STUDY_AI_API_KEY or OPENAI_API_KEY)")]
    MissingApiKey,
}

impl ConfigError {
    fn invalid(key: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Retry, backoff and fallback knobs for [`crate::UpstreamCallPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per request, initial call included
    pub max_attempts: u32,
    /// Backoff before retry `n` (0-based) is `base_delay_ms * 2^n`
    pub base_delay_ms: u64,
    /// Substitute a buffered call after the first failed streamed call
    pub stream_fallback: bool,
    /// Keep retrying upstream 401/403 like transient failures
    pub retry_unauthorized: bool,
    /// Per-attempt ceiling; an attempt running longer counts as unavailable
    pub attempt_timeout_ms: Option<u64>,
    /// Overall budget for one request, attempts and backoff included
    pub deadline_ms: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            stream_fallback: false,
            retry_unauthorized: true,
            attempt_timeout_ms: None,
            deadline_ms: None,
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Same settings with the streaming→buffered substitution switched on or off.
    pub fn with_stream_fallback(mut self, enable: bool) -> Self {
        self.stream_fallback = enable;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "retry.max_attempts",
                "0",
                "at least one attempt is required",
            ));
        }
        if self.attempt_timeout_ms == Some(0) {
            return Err(ConfigError::invalid(
                "retry.attempt_timeout_ms",
                "0",
                "timeout must be positive",
            ));
        }
        Ok(())
    }
}

/// Process-wide gateway configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Upstream API key (required)
    pub api_key: Option<String>,
    /// Upstream model id used by every route
    pub model: String,
    /// Optional organization / tenant identifier sent upstream
    pub organization: Option<String>,
    /// Base URL of the OpenAI-compatible upstream (no trailing `/chat/completions`)
    pub base_url: String,
    /// Listen address of the HTTP server
    pub bind: SocketAddr,
    /// Transport-level request timeout
    pub http_timeout_secs: u64,
    pub retry: RetrySettings,
    /// Allowed CORS origins; empty disables the CORS layer
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            organization: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            bind: default_bind(),
            http_timeout_secs: 60,
            retry: RetrySettings::default(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_bind() -> SocketAddr {
    DEFAULT_BIND
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080)))
}

// The key never shows up in logs.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .field("bind", &self.bind)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("retry", &self.retry)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl GatewayConfig {
    /// Load from an optional YAML file, then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`GatewayConfig::load`] with an injectable variable lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// `chat/completions` endpoint derived from `base_url`.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| -> Option<(String, String)> {
            keys.iter().find_map(|k| {
                lookup(k)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (k.to_string(), v))
            })
        };

        if let Some((_, v)) = first(&["STUDY_AI_API_KEY", "OPENAI_API_KEY"]) {
            self.api_key = Some(v);
        }
        if let Some((_, v)) = first(&["STUDY_AI_MODEL", "OPENAI_MODEL"]) {
            self.model = v;
        }
        if let Some((_, v)) = first(&["STUDY_AI_ORGANIZATION", "OPENAI_ORGANIZATION"]) {
            self.organization = Some(v);
        }
        if let Some((_, v)) = first(&["STUDY_AI_BASE_URL"]) {
            self.base_url = v;
        }
        if let Some((k, v)) = first(&["STUDY_AI_BIND"]) {
            self.bind = v
                .parse()
                .map_err(|_| ConfigError::invalid(&k, v.as_str(), "expected host:port"))?;
        }
        if let Some((k, v)) = first(&["STUDY_AI_HTTP_TIMEOUT_SECS"]) {
            self.http_timeout_secs = parse_number(&k, &v)?;
        }
        if let Some((k, v)) = first(&["STUDY_AI_MAX_ATTEMPTS"]) {
            self.retry.max_attempts = parse_number(&k, &v)?;
        }
        if let Some((k, v)) = first(&["STUDY_AI_BASE_DELAY_MS"]) {
            self.retry.base_delay_ms = parse_number(&k, &v)?;
        }
        if let Some((k, v)) = first(&["STUDY_AI_ATTEMPT_TIMEOUT_MS"]) {
            self.retry.attempt_timeout_ms = Some(parse_number(&k, &v)?);
        }
        if let Some((k, v)) = first(&["STUDY_AI_DEADLINE_MS"]) {
            self.retry.deadline_ms = Some(parse_number(&k, &v)?);
        }
        if let Some((k, v)) = first(&["STUDY_AI_RETRY_UNAUTHORIZED"]) {
            self.retry.retry_unauthorized = parse_flag(&k, &v)?;
        }
        if let Some((_, v)) = first(&["STUDY_AI_CORS_ORIGINS"]) {
            self.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self
            .api_key
            .as_deref()
            .map(|k| k.trim().is_empty())
            .unwrap_or(true)
        {
            return Err(ConfigError::MissingApiKey);
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("model", "", "model must not be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::invalid(
                "base_url",
                self.base_url.as_str(),
                "expected an http(s) URL",
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "http_timeout_secs",
                "0",
                "timeout must be positive",
            ));
        }
        self.retry.validate()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(key, value, "expected a non-negative integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, value, "expected true/false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_need_only_a_key() {
        let config = assert_ok!(GatewayConfig::load_with(
            None,
            lookup(&[("OPENAI_API_KEY", "sk-test")])
        ));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_millis(500));
        assert!(config.retry.retry_unauthorized);
        assert!(!config.retry.stream_fallback);
        assert_eq!(
            config.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = assert_err!(GatewayConfig::load_with(None, lookup(&[])));
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn study_ai_vars_take_precedence() {
        let config = assert_ok!(GatewayConfig::load_with(
            None,
            lookup(&[
                ("STUDY_AI_API_KEY", "primary"),
                ("OPENAI_API_KEY", "secondary"),
                ("OPENAI_MODEL", "gpt-4o"),
                ("OPENAI_ORGANIZATION", "org-42"),
                ("STUDY_AI_BASE_URL", "http://localhost:9000/v1/"),
                ("STUDY_AI_MAX_ATTEMPTS", "5"),
                ("STUDY_AI_BASE_DELAY_MS", "20"),
                ("STUDY_AI_DEADLINE_MS", "15000"),
                ("STUDY_AI_RETRY_UNAUTHORIZED", "false"),
                ("STUDY_AI_CORS_ORIGINS", "http://localhost:5173, https://study.example"),
            ])
        ));
        assert_eq!(config.api_key.as_deref(), Some("primary"));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.organization.as_deref(), Some("org-42"));
        assert_eq!(
            config.completions_url(),
            "http://localhost:9000/v1/chat/completions"
        );
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 20);
        assert_eq!(config.retry.deadline(), Some(Duration::from_secs(15)));
        assert!(!config.retry.retry_unauthorized);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn bad_numbers_are_reported_with_their_key() {
        let err = assert_err!(GatewayConfig::load_with(
            None,
            lookup(&[("OPENAI_API_KEY", "k"), ("STUDY_AI_MAX_ATTEMPTS", "three")])
        ));
        assert!(err.to_string().contains("STUDY_AI_MAX_ATTEMPTS"));

        let err = assert_err!(GatewayConfig::load_with(
            None,
            lookup(&[("OPENAI_API_KEY", "k"), ("STUDY_AI_MAX_ATTEMPTS", "0")])
        ));
        assert!(err.to_string().contains("retry.max_attempts"));
    }

    #[test]
    fn yaml_file_values_are_overridden_by_env() {
        let yaml = r#"
model: gpt-4.1-mini
bind: "0.0.0.0:9090"
retry:
  max_attempts: 4
  stream_fallback: true
"#;
        let mut config = assert_ok!(GatewayConfig::from_yaml_str(yaml));
        assert_eq!(config.model, "gpt-4.1-mini");
        assert_eq!(config.bind.port(), 9090);
        assert_eq!(config.retry.max_attempts, 4);
        assert!(config.retry.stream_fallback);
        assert_eq!(config.retry.base_delay_ms, 500);

        assert_ok!(config.apply_env(&lookup(&[("STUDY_AI_MODEL", "gpt-4o")])));
        assert_eq!(config.model, "gpt-4o");
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let config = GatewayConfig {
            api_key: Some("sk-secret".into()),
            ..GatewayConfig::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
