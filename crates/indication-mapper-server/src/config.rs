//! Server configuration, resolved once at startup.

use std::path::PathBuf;
use std::time::Duration;

use indication_mapper_core::PolicyKind;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DATABASE_PATH: &str = "indication_mapper.db";
pub const DEFAULT_DAILYMED_BASE_URL: &str = "https://dailymed.nlm.nih.gov/dailymed";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";
pub const DEFAULT_PROGRAM_DATA_DIR: &str = "challenge";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Configuration errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Validated server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: String,
    pub database_path: String,
    pub match_policy: PolicyKind,
    pub dailymed_base_url: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub program_data_dir: PathBuf,
    pub upstream_timeout: Duration,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let match_policy = value("MAPPER_MATCH_POLICY")
            .map(|v| v.parse::<PolicyKind>())
            .transpose()
            .map_err(|reason| ConfigError::InvalidValue {
                var: "MAPPER_MATCH_POLICY",
                reason,
            })?
            .unwrap_or_default();

        let timeout_secs = value("UPSTREAM_TIMEOUT_SECS")
            .map(|v| parse_timeout(&v))
            .transpose()?
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);

        Ok(Self {
            addr: value("MAPPER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into()),
            database_path: value("MAPPER_DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.into()),
            match_policy,
            dailymed_base_url: base_url(
                "DAILYMED_BASE_URL",
                value("DAILYMED_BASE_URL"),
                DEFAULT_DAILYMED_BASE_URL,
            )?,
            ollama_base_url: base_url(
                "OLLAMA_BASE_URL",
                value("OLLAMA_BASE_URL"),
                DEFAULT_OLLAMA_BASE_URL,
            )?,
            ollama_model: value("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.into()),
            program_data_dir: PathBuf::from(
                value("PROGRAM_DATA_DIR").unwrap_or_else(|| DEFAULT_PROGRAM_DATA_DIR.into()),
            ),
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_timeout(raw: &str) -> ConfigResult<u64> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var: "UPSTREAM_TIMEOUT_SECS",
            reason: "must be greater than zero".into(),
        }),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::InvalidValue {
            var: "UPSTREAM_TIMEOUT_SECS",
            reason: format!("'{}' is not a number of seconds ({})", raw, e),
        }),
    }
}

fn base_url(var: &'static str, value: Option<String>, default: &str) -> ConfigResult<String> {
    let url = value.unwrap_or_else(|| default.to_string());
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            var,
            reason: format!("'{}' is not an http(s) URL", url),
        });
    }
    Ok(url.trim_end_matches('/').to_string())
}
