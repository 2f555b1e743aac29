//! commitcraft - A CLI tool that generates commit messages from staged changes.
//!
//! # Overview
//!
//! commitcraft sends the staged diff to a Mistral-compatible chat completion
//! API, sanitizes and deduplicates the returned candidates, and streams them
//! as choices to an interactive picker. Backend failures arrive in the same
//! stream as a single disabled error choice.

pub mod config;
pub mod error;
pub mod git;
pub mod llm;

// Re-export commonly used types
pub use config::{BackendConfig, BackendKind, CommitType, Credentials, GenerationParams};
pub use error::{CommitError, ConfigError, GenerationError};
pub use git::StagedDiff;
pub use llm::{Backend, ChoiceRecord, CompletionBackend, GenerationService};
