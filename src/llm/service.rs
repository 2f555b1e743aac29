//! The generation lifecycle: prompt, backend call, sanitizing, emission.

use std::sync::Arc;

use async_stream::stream;
use futures_core::Stream;
use tracing::{debug, warn};

use crate::config::GenerationParams;
use crate::error::GenerationError;
use crate::llm::backend::{Backend, CompletionBackend};
use crate::llm::choice::ChoiceRecord;
use crate::llm::logger::{LogEntry, ResponseLogger, spawn_log};
use crate::llm::prompt::{PromptInput, build_prompt};
use crate::llm::sanitize::sanitize_response;

/// Generates commit message candidates for one diff with one backend.
pub struct GenerationService<B = Backend> {
    backend: B,
    params: GenerationParams,
    diff: String,
    logger: Option<Arc<dyn ResponseLogger>>,
    tag_candidates: bool,
}

impl<B: CompletionBackend> GenerationService<B> {
    pub fn new(backend: B, params: GenerationParams, diff: impl Into<String>) -> Self {
        Self {
            backend,
            params,
            diff: diff.into(),
            logger: None,
            tag_candidates: false,
        }
    }

    /// Attach a logger. It is only invoked when `params.logging` is set.
    pub fn with_logger(mut self, logger: Arc<dyn ResponseLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Prefix candidate labels with the backend's colored tag.
    pub fn with_tagged_labels(mut self, tagged: bool) -> Self {
        self.tag_candidates = tagged;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// The prompt this service sends.
    pub fn prompt(&self) -> String {
        build_prompt(&PromptInput {
            locale: &self.params.locale,
            diff: &self.diff,
            generate: self.params.generate,
            max_length: self.params.max_length,
            commit_type: self.params.commit_type,
            user_prompt: self.params.user_prompt.as_deref(),
        })
    }

    /// Run the pipeline and return the candidates or the first failure.
    ///
    /// An empty candidate list after sanitizing counts as `NoContent`.
    pub async fn generate_candidates(&self) -> Result<Vec<String>, GenerationError> {
        let prompt = self.prompt();
        debug!(
            "{} prompt: {} chars, {} candidate(s) requested",
            self.backend.name(),
            prompt.len(),
            self.params.generate
        );

        let raw = self.backend.complete(&prompt).await?;

        if self.params.logging
            && let Some(logger) = &self.logger
        {
            let entry = LogEntry::new(self.backend.name(), &self.diff, &prompt, &raw);
            spawn_log(Arc::clone(logger), entry);
        }

        let candidates = sanitize_response(&raw, self.params.commit_type, self.params.generate);
        if candidates.is_empty() {
            debug!("Raw response had no usable lines: {:?}", raw);
            return Err(GenerationError::NoContent {
                backend: self.backend.name().to_string(),
            });
        }

        debug!("{} candidate(s) after sanitizing", candidates.len());
        Ok(candidates)
    }

    /// Stream of choices for the picker.
    ///
    /// Nothing happens until the stream is first polled; dropping it cancels
    /// the in-flight request. Yields one record per candidate, or exactly one
    /// error record, then ends.
    pub fn generate(&self) -> impl Stream<Item = ChoiceRecord> + '_ {
        stream! {
            match self.generate_candidates().await {
                Ok(candidates) => {
                    for candidate in candidates {
                        yield self.candidate_record(candidate);
                    }
                }
                Err(err) => {
                    warn!("{} generation failed: {}", self.backend.name(), err);
                    yield ChoiceRecord::error(self.backend.identity(), &err);
                }
            }
        }
    }

    fn candidate_record(&self, candidate: String) -> ChoiceRecord {
        if self.tag_candidates {
            ChoiceRecord::tagged_candidate(self.backend.identity(), candidate)
        } else {
            ChoiceRecord::candidate(candidate)
        }
    }
}
