//! Completion backend abstraction and the fixed decoding configuration

mod watsonx;

pub use watsonx::WatsonxCompleter;

use crate::session::Topic;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when talking to the completion backend
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IAM token exchange failed: {0}")]
    Auth(String),

    #[error("completion endpoint returned error: {0}")]
    Upstream(String),
}

/// Decoding configuration sent with every generation request.
///
/// The dashboard uses one fixed configuration for both panels; requests are
/// stateless and carry no conversation history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub decoding_method: String,
    pub temperature: f32,
    pub min_new_tokens: u32,
    pub max_new_tokens: u32,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            decoding_method: "greedy".to_string(),
            temperature: 0.7,
            min_new_tokens: 5,
            max_new_tokens: 300,
            stop_sequences: vec!["Human:".to_string(), "Observation".to_string()],
        }
    }
}

/// A completed generation, returned verbatim from the backend
#[derive(Debug, Clone)]
pub struct Completion {
    /// The generated text, exactly as the model produced it
    pub text: String,

    /// Model that served the request
    pub model_id: String,

    /// Token usage statistics, when the backend reports them
    pub usage: Option<TokenUsage>,

    /// Wall-clock time for the request (ms)
    pub duration_ms: u64,
}

/// Token usage statistics
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub generated_tokens: u32,
}

/// Capability seam for the completion backend.
///
/// Callers must reject blank prompts before invoking `generate`; the trait
/// forwards whatever it is given. One call maps to exactly one outbound
/// request: no retries, no streaming, no caching.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Backend name for logging/identification
    fn name(&self) -> &str;

    /// Model identifier that would serve the given topic
    fn model_for(&self, topic: Topic) -> &str;

    /// Generate a completion for the prompt under the topic's model
    async fn generate(&self, topic: Topic, prompt: &str) -> Result<Completion, ProviderError>;
}
