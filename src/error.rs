//! Error types for commitcraft modules using thiserror.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while generating commit message candidates.
///
/// Every variant is terminal for the generation call that produced it. The
/// generation service converts these into a single error choice; they never
/// escape the choice stream.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Error connecting to {host} ({syscall}). Are you connected to the internet?")]
    HostNotFound { host: String, syscall: String },

    #[error("Invalid model '{model}': not available for this API key")]
    InvalidModel { model: String },

    #[error("Unexpected response from {backend}: no content returned. Please open a bug report")]
    NoContent { backend: String },

    #[error("Request to {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },

    #[error("API responded with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl GenerationError {
    /// Whether this is a recognised, user-actionable condition rather than an
    /// unexpected backend failure.
    pub fn is_known(&self) -> bool {
        matches!(
            self,
            GenerationError::HostNotFound { .. }
                | GenerationError::InvalidModel { .. }
                | GenerationError::Timeout { .. }
        )
    }
}

/// Errors from building backends out of user configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing API key for {backend}. Set the {env_var} environment variable")]
    MissingApiKey {
        backend: &'static str,
        env_var: &'static str,
    },

    #[error("Unknown backend '{0}'. Expected one of: mistral, codestral")]
    UnknownBackend(String),

    #[error("Invalid proxy URL '{url}': {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Generate count must be at least 1")]
    ZeroCandidates,

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,
}

/// Errors from git operations around the commit.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No staged changes. Stage files with `git add` first")]
    NoChanges,

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to read index: {0}")]
    IndexFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),
}
