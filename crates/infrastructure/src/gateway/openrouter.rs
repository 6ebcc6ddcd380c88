//! HTTP client for OpenRouter and other OpenAI-compatible chat APIs.

use async_trait::async_trait;
use benchmaker_application::InferenceGateway;
use benchmaker_common::{CancellationToken, GatewayConfig};
use benchmaker_domain::{ChatCompletion, ChatMessage, GatewayError, ModelInfo, ModelParameters};
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};
use url::Url;

use super::sse::{SseDecoder, SseLine};
use super::wire::{ChatRequest, ChatResponse, ModelsResponse, StreamChunk};

/// Longest error body kept on [`GatewayError::Http`]
const ERROR_BODY_LIMIT: usize = 500;

/// Inference gateway speaking the `/models` and `/chat/completions` endpoints
#[derive(Clone)]
pub struct HttpInferenceGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    referer: Option<String>,
    app_title: Option<String>,
}

impl HttpInferenceGateway {
    /// Build a gateway from configuration
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Url::parse(&config.base_url).map_err(|e| {
            GatewayError::Configuration(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            referer: config.referer.clone(),
            app_title: config.app_title.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Add authentication and attribution headers
    fn decorate(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        };
        let builder = match &self.referer {
            Some(referer) => builder.header("HTTP-Referer", referer),
            None => builder,
        };
        match &self.app_title {
            Some(title) => builder.header("X-Title", title),
            None => builder,
        }
    }

    /// Send a request, giving up as soon as `cancel` fires
    async fn send(&self, builder: RequestBuilder, cancel: &CancellationToken) -> Result<Response, GatewayError> {
        let response = cancel
            .run_until_cancelled(self.decorate(builder).send())
            .await
            .map_err(|_| GatewayError::Cancelled)?
            .map_err(transport_error)?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Http {
            status,
            body: truncate(&body, ERROR_BODY_LIMIT),
        })
    }

    async fn post_chat(
        &self,
        request: &ChatRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Response, GatewayError> {
        let builder = self.client.post(self.endpoint("chat/completions")).json(request);
        self.send(builder, cancel).await
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_models(&self) -> Result<Vec<ModelInfo>, GatewayError> {
        let builder = self.client.get(self.endpoint("models"));
        let response = self.send(builder, &CancellationToken::new()).await?;
        let body: ModelsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("models list: {}", e)))?;

        let mut models: Vec<ModelInfo> = body.data.into_iter().map(ModelInfo::from).collect();
        models.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        debug!(count = models.len(), "Fetched models");
        Ok(models)
    }

    #[instrument(skip(self, messages, params, cancel), fields(model = %model))]
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &ModelParameters,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, GatewayError> {
        let request = ChatRequest::new(model, messages, params, false);
        let response = self.post_chat(&request, cancel).await?;

        let body: ChatResponse = cancel
            .run_until_cancelled(response.json())
            .await
            .map_err(|_| GatewayError::Cancelled)?
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(GatewayError::Upstream(error.describe()));
        }

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidResponse("response has no choices".to_string()))?;

        Ok(ChatCompletion {
            content: choice.message.and_then(|m| m.content).unwrap_or_default(),
            usage: body.usage.map(Into::into),
        })
    }

    #[instrument(skip(self, messages, params, chunks, cancel), fields(model = %model))]
    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &ModelParameters,
        chunks: mpsc::Sender<String>,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, GatewayError> {
        let request = ChatRequest::new(model, messages, params, true);
        let response = self.post_chat(&request, cancel).await?;

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut completion = ChatCompletion::default();

        let mut exhausted = false;
        'read: while !exhausted {
            // Dropping the body stream aborts the request
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                next = body.next() => next,
            };

            let lines = match next {
                Some(bytes) => decoder.push(&bytes.map_err(transport_error)?),
                None => {
                    exhausted = true;
                    decoder.finish().into_iter().collect()
                }
            };

            for line in lines {
                if cancel.is_cancelled() {
                    return Err(GatewayError::Cancelled);
                }
                let payload = match line {
                    SseLine::Done => break 'read,
                    SseLine::Data(payload) => payload,
                };

                let chunk: StreamChunk = match serde_json::from_str(&payload) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(error = %e, "Skipping undecodable stream chunk");
                        continue;
                    }
                };

                if let Some(error) = chunk.error.as_ref() {
                    return Err(GatewayError::Upstream(error.describe()));
                }
                if let Some(delta) = chunk.delta() {
                    completion.content.push_str(delta);
                    // A dropped receiver only means nobody is watching the stream
                    let _ = chunks.send(delta.to_string()).await;
                }
                if let Some(usage) = chunk.usage {
                    completion.usage = Some(usage.into());
                }
            }
        }

        debug!(chars = completion.content.len(), "Stream finished");
        Ok(completion)
    }
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Transport(format!("request timed out: {}", error))
    } else {
        GatewayError::Transport(error.to_string())
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
