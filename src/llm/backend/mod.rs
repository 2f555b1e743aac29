//! Model-backed completion backends.
//!
//! Two shapes share one contract: [`DirectBackend`] posts straight to the
//! chat endpoint, [`ValidatedBackend`] first confirms the model exists via
//! the models list. [`Backend`] is the tagged union selected from
//! configuration; endpoint and key routing is decided once, in
//! [`Backend::from_config`].

use std::fmt;

use async_trait::async_trait;
use console::Color;
use tracing::{debug, trace};

use crate::config::{BackendConfig, BackendKind, GenerationParams};
use crate::error::{ConfigError, GenerationError};
use crate::llm::choice::BackendIdentity;
use crate::llm::transport::HttpTransport;
use crate::llm::wire::{ChatRequest, ChatResponse};

pub mod direct;
pub mod validated;

pub use direct::DirectBackend;
pub use validated::ValidatedBackend;

/// Default Mistral platform API base.
pub const MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";

/// Default Codestral API base.
pub const CODESTRAL_API_BASE: &str = "https://codestral.mistral.ai/v1";

pub const MISTRAL_IDENTITY: BackendIdentity = BackendIdentity {
    tag: "[Mistral]",
    foreground: Color::White,
    background: Color::Color256(208),
    error_prefix: "[Mistral] Failed to generate commit message:",
};

pub const CODESTRAL_IDENTITY: BackendIdentity = BackendIdentity {
    tag: "[Codestral]",
    foreground: Color::Black,
    background: Color::Color256(214),
    error_prefix: "[Codestral] Failed to generate commit message:",
};

/// Contract every completion backend implements.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    fn identity(&self) -> &BackendIdentity;

    /// Send `prompt` and return the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Endpoint and credential pairing, fixed at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct Route {
    pub base_url: String,
    pub api_key: String,
}

impl Route {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Model and sampling settings sent with every chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&GenerationParams> for ChatSettings {
    fn from(params: &GenerationParams) -> Self {
        Self {
            model: params.model.clone(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }
}

/// The configured backend.
#[derive(Debug, Clone)]
pub enum Backend {
    Direct(DirectBackend),
    Validated(ValidatedBackend),
}

impl Backend {
    /// Build the backend for `config`, resolving endpoint and key once.
    ///
    /// - `codestral`: direct calls to the Codestral endpoint.
    /// - `mistral`: validated calls; `codestral-*` models are served from the
    ///   Codestral endpoint with the Codestral key, everything else from the
    ///   Mistral platform with the Mistral key.
    pub fn from_config(
        config: &BackendConfig,
        params: &GenerationParams,
    ) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(params.timeout, params.proxy.as_deref())?;
        let settings = ChatSettings::from(params);

        let backend = match config.kind {
            BackendKind::Codestral => {
                let route = codestral_route(config, params)?;
                Backend::Direct(DirectBackend::new(
                    CODESTRAL_IDENTITY,
                    route,
                    settings,
                    transport,
                ))
            }
            BackendKind::Mistral => {
                let route = if is_codestral_model(&params.model) {
                    codestral_route(config, params)?
                } else {
                    mistral_route(config, params)?
                };
                Backend::Validated(ValidatedBackend::new(
                    MISTRAL_IDENTITY,
                    route,
                    settings,
                    transport,
                ))
            }
        };

        debug!(
            "Using {} backend at {} with model {}",
            config.kind,
            backend.route().base_url,
            params.model
        );
        Ok(backend)
    }

    pub fn route(&self) -> &Route {
        match self {
            Backend::Direct(b) => b.route(),
            Backend::Validated(b) => b.route(),
        }
    }
}

#[async_trait]
impl CompletionBackend for Backend {
    fn name(&self) -> &str {
        match self {
            Backend::Direct(b) => b.name(),
            Backend::Validated(b) => b.name(),
        }
    }

    fn identity(&self) -> &BackendIdentity {
        match self {
            Backend::Direct(b) => b.identity(),
            Backend::Validated(b) => b.identity(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        match self {
            Backend::Direct(b) => b.complete(prompt).await,
            Backend::Validated(b) => b.complete(prompt).await,
        }
    }
}

/// Whether `model` is served by the Codestral endpoint.
pub fn is_codestral_model(model: &str) -> bool {
    model.trim().to_ascii_lowercase().starts_with("codestral")
}

fn mistral_route(config: &BackendConfig, params: &GenerationParams) -> Result<Route, ConfigError> {
    let key = params
        .credentials
        .mistral
        .as_deref()
        .ok_or(ConfigError::MissingApiKey {
            backend: "Mistral",
            env_var: crate::config::MISTRAL_KEY_ENV_VAR,
        })?;
    let base = config.mistral_url.as_deref().unwrap_or(MISTRAL_API_BASE);
    Ok(Route::new(base, key))
}

fn codestral_route(
    config: &BackendConfig,
    params: &GenerationParams,
) -> Result<Route, ConfigError> {
    let key = params
        .credentials
        .codestral
        .as_deref()
        .ok_or(ConfigError::MissingApiKey {
            backend: "Codestral",
            env_var: crate::config::CODESTRAL_KEY_ENV_VAR,
        })?;
    let base = config.codestral_url.as_deref().unwrap_or(CODESTRAL_API_BASE);
    Ok(Route::new(base, key))
}

/// Send one chat request and apply the acceptance rule.
///
/// A response is accepted only when its first choice carries non-empty
/// content; anything else is a protocol anomaly reported as `NoContent`.
pub(crate) async fn request_completion(
    transport: &HttpTransport,
    route: &Route,
    settings: &ChatSettings,
    backend_name: &str,
    prompt: &str,
) -> Result<String, GenerationError> {
    let request = ChatRequest::new(
        &settings.model,
        prompt.to_string(),
        settings.temperature,
        settings.max_tokens,
    );
    trace!("Chat request seed: {}", request.random_seed);

    let response: ChatResponse = transport
        .post_json(&route.chat_url(), &route.api_key, &request)
        .await?;

    if let Some(usage) = &response.usage {
        debug!(
            "{} usage: {} prompt + {} completion tokens",
            backend_name, usage.prompt_tokens, usage.completion_tokens
        );
    }

    response
        .first_content()
        .map(str::to_string)
        .ok_or_else(|| GenerationError::NoContent {
            backend: backend_name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    fn params(model: &str) -> GenerationParams {
        GenerationParams {
            model: model.to_string(),
            credentials: Credentials {
                mistral: Some("mistral-key".to_string()),
                codestral: Some("codestral-key".to_string()),
            },
            ..GenerationParams::default()
        }
    }

    #[test]
    fn test_route_urls() {
        let route = Route::new("http://localhost:1234/v1/", "k");
        assert_eq!(route.chat_url(), "http://localhost:1234/v1/chat/completions");
        assert_eq!(route.models_url(), "http://localhost:1234/v1/models");
    }

    #[test]
    fn test_mistral_model_routes_to_platform() {
        let config = BackendConfig::new(BackendKind::Mistral);
        let backend = Backend::from_config(&config, &params("mistral-small-latest")).unwrap();
        assert!(matches!(backend, Backend::Validated(_)));
        assert_eq!(backend.route(), &Route::new(MISTRAL_API_BASE, "mistral-key"));
        assert_eq!(backend.name(), "Mistral");
    }

    #[test]
    fn test_codestral_model_on_mistral_routes_to_codestral_host() {
        let config = BackendConfig::new(BackendKind::Mistral);
        let backend = Backend::from_config(&config, &params("codestral-latest")).unwrap();
        assert!(matches!(backend, Backend::Validated(_)));
        assert_eq!(
            backend.route(),
            &Route::new(CODESTRAL_API_BASE, "codestral-key")
        );
    }

    #[test]
    fn test_codestral_kind_is_direct() {
        let config = BackendConfig::new(BackendKind::Codestral);
        let backend = Backend::from_config(&config, &params("codestral-latest")).unwrap();
        assert!(matches!(backend, Backend::Direct(_)));
        assert_eq!(backend.identity(), &CODESTRAL_IDENTITY);
    }

    #[test]
    fn test_url_overrides_apply() {
        let mut config = BackendConfig::new(BackendKind::Mistral);
        config.mistral_url = Some("http://127.0.0.1:9000/v1".to_string());
        let backend = Backend::from_config(&config, &params("mistral-large-latest")).unwrap();
        assert_eq!(backend.route().base_url, "http://127.0.0.1:9000/v1");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let mut p = params("codestral-latest");
        p.credentials.codestral = None;
        let config = BackendConfig::new(BackendKind::Mistral);
        let result = Backend::from_config(&config, &p);
        assert!(matches!(
            result,
            Err(ConfigError::MissingApiKey { env_var: "CODESTRAL_API_KEY", .. })
        ));
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let config = BackendConfig::new(BackendKind::Mistral);
        let backend = Backend::from_config(&config, &params("mistral-small-latest")).unwrap();

        let debug = format!("{:?}", backend);
        assert!(!debug.contains("mistral-key"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains(MISTRAL_API_BASE));
    }

    #[test]
    fn test_is_codestral_model() {
        assert!(is_codestral_model("codestral-latest"));
        assert!(is_codestral_model("Codestral-2405"));
        assert!(!is_codestral_model("mistral-small-latest"));
        assert!(!is_codestral_model("open-codestral-mamba"));
    }
}
