//! LLM backends, prompt construction and the generation pipeline.

pub mod backend;
pub mod choice;
pub mod json;
pub mod logger;
pub mod prompt;
pub mod sanitize;
pub mod service;
pub mod transport;
pub mod wire;

pub use backend::{Backend, CompletionBackend, DirectBackend, Route, ValidatedBackend};
pub use choice::{BackendIdentity, ChoiceRecord, simplify_error_message};
pub use logger::{FileResponseLogger, LogEntry, ResponseLogger};
pub use prompt::{PromptInput, build_prompt};
pub use sanitize::{deduplicate, sanitize_response};
pub use service::GenerationService;
pub use transport::HttpTransport;
