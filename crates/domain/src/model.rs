//! Models, chat messages and completions exchanged with the inference gateway.

use serde::{Deserialize, Serialize};

/// Published per-token prices in USD
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPricing {
    /// Price of one prompt token
    pub prompt: f64,
    /// Price of one completion token
    pub completion: f64,
}

impl ModelPricing {
    /// Cost of a completion with the given usage
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        usage.prompt_tokens as f64 * self.prompt + usage.completion_tokens as f64 * self.completion
    }
}

/// A model offered by the inference gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Gateway model id, e.g. `openai/gpt-4o-mini`
    pub id: String,
    /// Display name
    pub name: String,
    /// Context window in tokens, when published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
    /// Per-token pricing
    #[serde(default)]
    pub pricing: ModelPricing,
}

impl ModelInfo {
    /// A model with unknown pricing
    pub fn unpriced(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            context_length: None,
            pricing: ModelPricing::default(),
        }
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions
    System,
    /// End user
    User,
    /// Model reply
    Assistant,
}

/// One message of a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: ChatRole,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// Token accounting reported by the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt_tokens: u64,
    /// Completion tokens
    pub completion_tokens: u64,
    /// Total tokens
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Usage with the total derived from its parts
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Final result of a chat call, streamed or not
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletion {
    /// Full response text
    pub content: String,
    /// Token usage, if the backend reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl ChatCompletion {
    /// Completion without usage data
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), usage: None }
    }

    /// True when the content is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
