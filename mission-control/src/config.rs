//! Mission Control configuration
//!
//! Loaded from a TOML file (`MISSION_CONTROL_CONFIG`) or the built-in example
//! compiled into the binary, then overridden by a few environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mission_types::RateLimitConfig;
use serde::{Deserialize, Serialize};

use crate::actors::RateGovernorArguments;
use crate::mission::orchestrator::check_agent_ids;

pub const CONFIG_PATH_ENV: &str = "MISSION_CONTROL_CONFIG";
pub const AI_SERVICE_URL_ENV: &str = "AI_SERVICE_URL";
pub const BIND_ENV: &str = "MISSION_CONTROL_BIND";
pub const CALL_TIMEOUT_ENV: &str = "MISSION_CALL_TIMEOUT_MS";

const BUILTIN_CONFIG_TOML: &str = include_str!("../config/mission-control.example.toml");

pub const DEFAULT_AGENTS: &[&str] = &["roxy", "echo", "blaze", "lumi", "vex", "lexi", "nova"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MissionConfig {
    pub service: ServiceConfig,
    pub limits: LimitsConfig,
    pub dispatch: DispatchConfig,
    pub governor: GovernorConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the AI inference service
    pub base_url: String,
    /// Deadline for a single outbound call, excluding time spent queued
    pub call_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            call_timeout_ms: 30_000,
        }
    }
}

impl ServiceConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// One `[limits.*]` table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitSpec {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl LimitSpec {
    pub const fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.max_requests, self.window_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    pub analyze: LimitSpec,
    pub contribute: LimitSpec,
    pub synthesize: LimitSpec,
    /// Inbound orchestration requests, per user
    pub api: LimitSpec,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            analyze: LimitSpec::new(10, 60_000),
            contribute: LimitSpec::new(30, 60_000),
            synthesize: LimitSpec::new(10, 60_000),
            api: LimitSpec::new(100, 15 * 60 * 1000),
        }
    }
}

/// How contribution calls are grouped under rate-limit keys
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchKeyMode {
    /// Every agent shares `mission.contribute`
    #[default]
    Shared,
    /// Each agent gets `mission.contribute:{agentId}`
    PerAgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    pub key_mode: DispatchKeyMode,
    /// Roster used when a session does not name any agents
    pub default_agents: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            key_mode: DispatchKeyMode::Shared,
            default_agents: DEFAULT_AGENTS.iter().map(|id| (*id).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GovernorConfig {
    pub max_queue_len: usize,
    pub idle_ttl_ms: u64,
    /// 0 disables the eviction sweep
    pub sweep_interval_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_queue_len: 1024,
            idle_ttl_ms: 10 * 60 * 1000,
            sweep_interval_ms: 60_000,
        }
    }
}

impl GovernorConfig {
    pub fn arguments(&self) -> RateGovernorArguments {
        RateGovernorArguments {
            max_queue_len: self.max_queue_len,
            idle_ttl: Duration::from_millis(self.idle_ttl_ms),
            sweep_interval: (self.sweep_interval_ms > 0)
                .then(|| Duration::from_millis(self.sweep_interval_ms)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8090".to_string(),
        }
    }
}

impl MissionConfig {
    /// Load from `MISSION_CONTROL_CONFIG` (or the built-in example), apply
    /// environment overrides, and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
        {
            Some(path) => Self::from_path(Path::new(&path))?,
            None => Self::built_in()?,
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded mission control config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn built_in() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_CONFIG_TOML)
    }

    /// Apply `AI_SERVICE_URL`, `MISSION_CONTROL_BIND` and
    /// `MISSION_CALL_TIMEOUT_MS` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = non_blank(AI_SERVICE_URL_ENV) {
            self.service.base_url = base_url;
        }
        if let Some(bind) = non_blank(BIND_ENV) {
            self.server.bind = bind;
        }
        if let Some(raw) = non_blank(CALL_TIMEOUT_ENV) {
            self.service.call_timeout_ms =
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: CALL_TIMEOUT_ENV.to_string(),
                        message: format!("{raw}: {e}"),
                    })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.base_url.trim().is_empty() {
            return Err(invalid("service.base_url", "must not be empty"));
        }
        if self.service.call_timeout_ms == 0 {
            return Err(invalid("service.call_timeout_ms", "must be greater than 0"));
        }
        for (name, spec) in [
            ("limits.analyze", &self.limits.analyze),
            ("limits.contribute", &self.limits.contribute),
            ("limits.synthesize", &self.limits.synthesize),
            ("limits.api", &self.limits.api),
        ] {
            if spec.max_requests == 0 {
                return Err(invalid(name, "max_requests must be at least 1"));
            }
            if spec.window_ms == 0 {
                return Err(invalid(name, "window_ms must be greater than 0"));
            }
        }
        check_agent_ids(&self.dispatch.default_agents)
            .map_err(|message| invalid("dispatch.default_agents", &message))?;
        if self.governor.max_queue_len == 0 {
            return Err(invalid("governor.max_queue_len", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Load `.env` from the working directory or the nearest ancestor that has one
pub fn load_env_file() {
    let Ok(mut current) = std::env::current_dir() else {
        return;
    };
    loop {
        let candidate = current.join(".env");
        if candidate.is_file() {
            match dotenvy::from_path(&candidate) {
                Ok(()) => tracing::debug!(path = %candidate.display(), "Loaded .env"),
                Err(err) => {
                    tracing::warn!(path = %candidate.display(), error = %err, "Failed to load .env")
                }
            }
            return;
        }
        if !current.pop() {
            return;
        }
    }
}
