//! Contract with the external inference API.

use async_trait::async_trait;
use benchmaker_common::CancellationToken;
use benchmaker_domain::{ChatCompletion, ChatMessage, GatewayError, ModelInfo, ModelParameters};
use tokio::sync::mpsc;

/// Client for an OpenAI-compatible chat API.
///
/// Implementations must surface transport and HTTP failures as
/// [`GatewayError`] and must observe `cancel` between stream chunks, returning
/// [`GatewayError::Cancelled`] promptly once it fires.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// List models offered by the backend
    async fn fetch_models(&self) -> Result<Vec<ModelInfo>, GatewayError>;

    /// Single-shot completion
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &ModelParameters,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, GatewayError>;

    /// Streaming completion.
    ///
    /// Every text delta is sent on `chunks` as it arrives; the sender is
    /// dropped when the call returns. The returned completion carries the
    /// full text and usage if the backend reported it.
    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &ModelParameters,
        chunks: mpsc::Sender<String>,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, GatewayError>;
}
