//! IBM watsonx.ai text generation backend

use super::{Completer, Completion, GenerationParams, ProviderError, TokenUsage};
use crate::session::Topic;
use crate::{ModelMap, WatsonxCredentials};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
const GENERATION_API_VERSION: &str = "2023-05-29";

/// watsonx.ai backend for the dashboard panels
pub struct WatsonxCompleter {
    client: Client,
    credentials: WatsonxCredentials,
    models: ModelMap,
    params: GenerationParams,
}

impl WatsonxCompleter {
    /// Create a new backend from startup credentials and the model map
    pub fn new(credentials: WatsonxCredentials, models: ModelMap) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
            credentials,
            models,
            params: GenerationParams::default(),
        }
    }

    /// Exchange the IBM Cloud API key for a short-lived bearer token.
    ///
    /// Requests are stateless, so the token is fetched per generation call
    /// rather than cached.
    async fn fetch_iam_token(&self) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(IAM_TOKEN_URL)
            .form(&[
                ("grant_type", IAM_GRANT_TYPE),
                ("apikey", self.credentials.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!("HTTP {}: {}", status, body)));
        }

        let token: IamTokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// IAM token endpoint response
#[derive(Deserialize)]
struct IamTokenResponse {
    access_token: String,
}

/// watsonx.ai generation request format
#[derive(Serialize)]
struct GenerationRequest<'a> {
    model_id: &'a str,
    input: &'a str,
    parameters: &'a GenerationParams,
    project_id: &'a str,
}

/// watsonx.ai generation response format
#[derive(Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Deserialize)]
struct GenerationResult {
    generated_text: String,
    #[serde(default)]
    generated_token_count: Option<u32>,
    #[serde(default)]
    input_token_count: Option<u32>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[async_trait]
impl Completer for WatsonxCompleter {
    fn name(&self) -> &str {
        "watsonx"
    }

    fn model_for(&self, topic: Topic) -> &str {
        self.models.model_for(topic)
    }

    async fn generate(&self, topic: Topic, prompt: &str) -> Result<Completion, ProviderError> {
        let model_id = self.models.model_for(topic).to_string();
        let token = self.fetch_iam_token().await?;

        let url = format!(
            "{}/ml/v1/text/generation?version={}",
            self.credentials.endpoint_url.trim_end_matches('/'),
            GENERATION_API_VERSION
        );

        let generation_request = GenerationRequest {
            model_id: &model_id,
            input: prompt,
            parameters: &self.params,
            project_id: &self.credentials.project_id,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&generation_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let generation: GenerationResponse = response.json().await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = generation.results.into_iter().next().ok_or_else(|| {
            ProviderError::Upstream("empty results array in generation response".to_string())
        })?;

        debug!(
            model = %model_id,
            topic = %topic,
            stop_reason = ?result.stop_reason,
            chars = result.generated_text.len(),
            "Completion received"
        );

        let usage = match (result.input_token_count, result.generated_token_count) {
            (Some(input), Some(generated)) => Some(TokenUsage {
                input_tokens: input,
                generated_tokens: generated,
            }),
            _ => None,
        };

        Ok(Completion {
            text: result.generated_text,
            model_id,
            usage,
            duration_ms,
        })
    }
}
