//! Backends that call the chat endpoint without model discovery.

use async_trait::async_trait;
use tracing::debug;

use crate::error::GenerationError;
use crate::llm::choice::BackendIdentity;
use crate::llm::transport::HttpTransport;

use super::{ChatSettings, CompletionBackend, Route, request_completion};

#[derive(Debug, Clone)]
pub struct DirectBackend {
    identity: BackendIdentity,
    route: Route,
    settings: ChatSettings,
    transport: HttpTransport,
}

impl DirectBackend {
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
}

#[async_trait]
impl CompletionBackend for DirectBackend {
    fn name(&self) -> &str {
        self.identity.tag.trim_matches(['[', ']'])
    }

    fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
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
