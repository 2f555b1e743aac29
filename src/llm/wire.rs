//! Request and response bodies for the Mistral-compatible chat API.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Range the per-request `random_seed` is drawn from.
pub const SEED_RANGE: RangeInclusive<u32> = 10..=1000;

/// Fixed nucleus sampling mass.
pub const TOP_P: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// The chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub stream: bool,
    pub safe_prompt: bool,
    pub random_seed: u32,
}

impl ChatRequest {
    /// Build a single-turn, non-streaming request with a fresh random seed.
    pub fn new(model: &str, prompt: String, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt),
            }],
            temperature,
            top_p: TOP_P,
            max_tokens,
            stream: false,
            safe_prompt: false,
            random_seed: rand::rng().random_range(SEED_RANGE),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Content of the first choice, if present and non-blank.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|content| !content.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Capability discovery response (`GET /models`).
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

impl ModelsResponse {
    /// Ids of entries whose `object` is `"model"`.
    pub fn model_ids(&self) -> Vec<&str> {
        self.data
            .iter()
            .filter(|m| m.object == "model")
            .map(|m| m.id.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub object: String,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub owned_by: Option<String>,
}
