//! Generation parameters and environment-driven configuration.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Default network timeout for backend calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable overriding the network timeout (seconds).
pub const TIMEOUT_ENV_VAR: &str = "COMMITCRAFT_TIMEOUT";

pub const MISTRAL_KEY_ENV_VAR: &str = "MISTRAL_API_KEY";
pub const CODESTRAL_KEY_ENV_VAR: &str = "CODESTRAL_API_KEY";
pub const MISTRAL_URL_ENV_VAR: &str = "COMMITCRAFT_MISTRAL_URL";
pub const CODESTRAL_URL_ENV_VAR: &str = "COMMITCRAFT_CODESTRAL_URL";
pub const LOG_DIR_ENV_VAR: &str = "COMMITCRAFT_LOG_DIR";

/// Commit message convention the model is asked to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    /// `type(scope): description`
    #[default]
    Conventional,
    /// `<emoji> description`
    Gitmoji,
    /// Free-form summary line.
    Plain,
}

impl CommitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Conventional => "conventional",
            CommitType::Gitmoji => "gitmoji",
            CommitType::Plain => "plain",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conventional" => Ok(CommitType::Conventional),
            "gitmoji" => Ok(CommitType::Gitmoji),
            "plain" | "" => Ok(CommitType::Plain),
            other => Err(format!(
                "unknown commit type '{other}' (expected conventional, gitmoji or plain)"
            )),
        }
    }
}

/// API keys per backend, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub mistral: Option<String>,
    pub codestral: Option<String>,
}

impl Credentials {
    /// Read keys from `MISTRAL_API_KEY` and `CODESTRAL_API_KEY`.
    ///
    /// Empty values are treated as unset.
    pub fn from_env() -> Self {
        Self {
            mistral: non_empty_env(MISTRAL_KEY_ENV_VAR),
            codestral: non_empty_env(CODESTRAL_KEY_ENV_VAR),
        }
    }
}

/// Parameters shared by every backend for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub locale: String,
    /// Number of candidates requested. An upper bound, not a guarantee.
    pub generate: usize,
    pub commit_type: CommitType,
    /// Replaces the built-in instructions when set.
    pub user_prompt: Option<String>,
    pub max_length: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// Write prompt and raw response to the log directory.
    pub logging: bool,
    pub credentials: Credentials,
    pub model: String,
    pub proxy: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            generate: 1,
            commit_type: CommitType::Conventional,
            user_prompt: None,
            max_length: 50,
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            logging: false,
            credentials: Credentials::default(),
            model: "mistral-small-latest".to_string(),
            proxy: None,
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generate == 0 {
            return Err(ConfigError::ZeroCandidates);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Which backend family to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Mistral platform, model availability checked before every call.
    Mistral,
    /// Codestral endpoint, called directly.
    Codestral,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mistral => "mistral",
            BackendKind::Codestral => "codestral",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mistral" => Ok(BackendKind::Mistral),
            "codestral" => Ok(BackendKind::Codestral),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Backend selection plus optional endpoint overrides.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub mistral_url: Option<String>,
    pub codestral_url: Option<String>,
}

impl BackendConfig {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            mistral_url: None,
            codestral_url: None,
        }
    }

    /// Apply endpoint overrides from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        self.mistral_url = non_empty_env(MISTRAL_URL_ENV_VAR).or(self.mistral_url);
        self.codestral_url = non_empty_env(CODESTRAL_URL_ENV_VAR).or(self.codestral_url);
        self
    }
}

/// Get the configured network timeout.
///
/// Reads `COMMITCRAFT_TIMEOUT` (seconds) when set, otherwise uses the
/// default. Invalid values log a warning and fall back to the default.
pub fn timeout_from_env() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
