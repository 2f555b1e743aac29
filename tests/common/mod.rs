//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::time::Duration;

use commitcraft::config::{BackendConfig, BackendKind, CommitType, Credentials, GenerationParams};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const MISTRAL_KEY: &str = "test-mistral-key";
pub const CODESTRAL_KEY: &str = "test-codestral-key";

/// Generation parameters with both keys set and a short timeout.
pub fn params(model: &str, generate: usize) -> GenerationParams {
    GenerationParams {
        model: model.to_string(),
        generate,
        commit_type: CommitType::Conventional,
        timeout: Duration::from_secs(5),
        credentials: Credentials {
            mistral: Some(MISTRAL_KEY.to_string()),
            codestral: Some(CODESTRAL_KEY.to_string()),
        },
        ..GenerationParams::default()
    }
}

/// Backend config whose endpoints both point at the mock server.
pub fn backend_config(server: &MockServer, kind: BackendKind) -> BackendConfig {
    let base = format!("{}/v1", server.uri());
    BackendConfig {
        kind,
        mistral_url: Some(base.clone()),
        codestral_url: Some(base),
    }
}

/// A chat completion body with a single choice.
pub fn chat_response(content: &str) -> Value {
    json!({
        "id": "cmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "mistral-small-latest",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 12, "total_tokens": 132}
    })
}

/// A models-list body offering `ids`, plus one non-model entry.
pub fn models_response(ids: &[&str]) -> Value {
    let mut data: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "object": "model",
                "created": 1_700_000_000,
                "owned_by": "mistralai"
            })
        })
        .collect();
    data.push(json!({
        "id": "mistral-huge",
        "object": "fine_tuning.job",
        "created": 1_700_000_000,
        "owned_by": "someone"
    }));
    json!({"object": "list", "data": data})
}
