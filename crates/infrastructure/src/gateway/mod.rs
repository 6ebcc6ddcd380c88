//! Inference gateway over HTTP.
//!
//! Speaks the OpenAI-compatible chat API as served by OpenRouter, including
//! server-sent-event streaming.

mod openrouter;
mod sse;
mod wire;

pub use openrouter::HttpInferenceGateway;
