//! Choice records emitted to the candidate picker.

use console::{Color, Style};

use crate::error::GenerationError;
use crate::llm::json::{error_message, find_json_object};

/// Display message used when a backend error carries no readable payload.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Presentation identity of a backend. Cosmetic only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendIdentity {
    /// Short tag shown before each candidate, e.g. `[Mistral]`.
    pub tag: &'static str,
    pub foreground: Color,
    pub background: Color,
    /// Prefix for error labels.
    pub error_prefix: &'static str,
}

impl BackendIdentity {
    /// The tag rendered with the backend's colors.
    pub fn styled_tag(&self) -> String {
        Style::new()
            .fg(self.foreground)
            .bg(self.background)
            .bold()
            .apply_to(self.tag)
            .to_string()
    }
}

/// One entry in the generation stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRecord {
    /// Text shown in the picker.
    pub label: String,
    /// The candidate message, or the simplified error text.
    pub value: String,
    pub is_error: bool,
    /// Disabled records are shown but cannot be picked.
    pub disabled: bool,
}

impl ChoiceRecord {
    pub fn candidate(message: String) -> Self {
        Self {
            label: message.clone(),
            value: message,
            is_error: false,
            disabled: false,
        }
    }

    /// A candidate whose label carries the backend tag.
    pub fn tagged_candidate(identity: &BackendIdentity, message: String) -> Self {
        Self {
            label: format!("{} {}", identity.styled_tag(), message),
            value: message,
            is_error: false,
            disabled: false,
        }
    }

    /// The single terminal record for a failed generation.
    pub fn error(identity: &BackendIdentity, err: &GenerationError) -> Self {
        let value = simplify_error_message(&err.to_string());
        let display = match err {
            GenerationError::Api { .. } | GenerationError::Request(_) => {
                embedded_error_message(&value).unwrap_or_else(|| UNKNOWN_ERROR.to_string())
            }
            _ => value.clone(),
        };
        Self {
            label: format!("{} {}", identity.error_prefix, display),
            value,
            is_error: true,
            disabled: true,
        }
    }
}

/// Strip every newline variant (`\r\n`, `\r`, `\n`) from an error message.
pub fn simplify_error_message(raw: &str) -> String {
    raw.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Message from a JSON error structure embedded in `text`, if one parses.
pub fn embedded_error_message(text: &str) -> Option<String> {
    find_json_object(text).as_ref().and_then(error_message)
}
