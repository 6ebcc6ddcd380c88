//! Request and response bodies of the OpenAI-compatible chat API.

use benchmaker_domain::{ChatMessage, ModelInfo, ModelParameters, ModelPricing, TokenUsage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, messages: &'a [ChatMessage], params: &ModelParameters, stream: bool) -> Self {
        Self {
            model,
            messages,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            stream,
            stream_options: stream.then_some(StreamOptions { include_usage: true }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StreamOptions {
    pub include_usage: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

impl From<WireUsage> for TokenUsage {
    fn from(usage: WireUsage) -> Self {
        let mut tokens = TokenUsage::new(usage.prompt_tokens, usage.completion_tokens);
        if let Some(total) = usage.total_tokens {
            tokens.total_tokens = total;
        }
        tokens
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
}

impl WireError {
    pub fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("unknown error");
        match &self.code {
            Some(code) => format!("{} (code {})", message, code),
            None => message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    #[serde(default)]
    pub error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseChoice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// One `data:` payload of a streamed completion
#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    #[serde(default)]
    pub error: Option<WireError>,
}

impl StreamChunk {
    pub fn delta(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.as_ref())
            .and_then(|delta| delta.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelsResponse {
    #[serde(default)]
    pub data: Vec<WireModel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireModel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub context_length: Option<u64>,
    #[serde(default)]
    pub pricing: Option<WirePricing>,
}

/// Prices arrive as decimal strings, sometimes as numbers
#[derive(Debug, Deserialize)]
pub(crate) struct WirePricing {
    #[serde(default)]
    pub prompt: Value,
    #[serde(default)]
    pub completion: Value,
}

fn price(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|p: &f64| p.is_finite() && *p >= 0.0).unwrap_or(0.0)
}

impl From<WireModel> for ModelInfo {
    fn from(model: WireModel) -> Self {
        let pricing = model
            .pricing
            .map(|p| ModelPricing {
                prompt: price(&p.prompt),
                completion: price(&p.completion),
            })
            .unwrap_or_default();
        Self {
            name: model.name.unwrap_or_else(|| model.id.clone()),
            id: model.id,
            context_length: model.context_length,
            pricing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_pricing_from_strings() {
        let model: WireModel = serde_json::from_str(
            r#"{"id": "openai/gpt-4o-mini", "name": "GPT-4o mini", "context_length": 128000,
                "pricing": {"prompt": "0.00000015", "completion": "0.0000006"}}"#,
        )
        .unwrap();
        let info = ModelInfo::from(model);
        assert_eq!(info.name, "GPT-4o mini");
        assert_eq!(info.context_length, Some(128000));
        assert!((info.pricing.prompt - 0.000_000_15).abs() < 1e-15);
        assert!((info.pricing.completion - 0.000_000_6).abs() < 1e-15);
    }

    #[test]
    fn test_model_without_pricing_or_name() {
        let model: WireModel = serde_json::from_str(r#"{"id": "local/llama", "pricing": {"prompt": "-1"}}"#).unwrap();
        let info = ModelInfo::from(model);
        assert_eq!(info.name, "local/llama");
        assert_eq!(info.pricing, ModelPricing::default());
    }

    #[test]
    fn test_stream_request_asks_for_usage() {
        let messages = vec![ChatMessage::user("hi")];
        let params = ModelParameters::default();
        let body = serde_json::to_value(ChatRequest::new("m", &messages, &params, true)).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert_eq!(body["messages"][0]["role"], "user");

        let body = serde_json::to_value(ChatRequest::new("m", &messages, &params, false)).unwrap();
        assert!(body.get("stream_options").is_none());
    }

    #[test]
    fn test_stream_chunk_delta() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"choices": [{"delta": {"content": "Hel"}}]}"#).unwrap();
        assert_eq!(chunk.delta(), Some("Hel"));

        let role_only: StreamChunk =
            serde_json::from_str(r#"{"choices": [{"delta": {"role": "assistant"}}]}"#).unwrap();
        assert_eq!(role_only.delta(), None);
    }
}
