//! Backends that confirm the model exists before generating.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::llm::choice::BackendIdentity;
use crate::llm::transport::HttpTransport;
use crate::llm::wire::ModelsResponse;

use super::{ChatSettings, CompletionBackend, Route, request_completion};

#[derive(Debug, Clone)]
pub struct ValidatedBackend {
    identity: BackendIdentity,
    route: Route,
    settings: ChatSettings,
    transport: HttpTransport,
}

impl ValidatedBackend {
    pub fn new(
        identity: BackendIdentity,
        route: Route,
        settings: ChatSettings,
        transport: HttpTransport,
    ) -> Self {
        Self {
            identity,
            route,
            settings,
            transport,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// List the ids of entries whose kind is `model`.
    pub async fn available_models(&self) -> Result<Vec<String>, GenerationError> {
        let response: ModelsResponse = self
            .transport
            .get_json(&self.route.models_url(), &self.route.api_key)
            .await?;
        let ids: Vec<String> = response
            .model_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        debug!("{} lists {} models", self.name(), ids.len());
        Ok(ids)
    }

    /// Fail with `InvalidModel` unless the configured model is listed.
    async fn ensure_model_available(&self) -> Result<(), GenerationError> {
        let models = self.available_models().await?;
        if models.iter().any(|id| id == &self.settings.model) {
            return Ok(());
        }
        warn!(
            "Model {} not offered by {}",
            self.settings.model,
            self.route.base_url
        );
        Err(GenerationError::InvalidModel {
            model: self.settings.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionBackend for ValidatedBackend {
    fn name(&self) -> &str {
        self.identity.tag.trim_matches(['[', ']'])
    }

    fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.ensure_model_available().await?;
        debug!("{} request for model {}", self.name(), self.settings.model);
        request_completion(
            &self.transport,
            &self.route,
            &self.settings,
            self.name(),
            prompt,
        )
        .await
    }
}
