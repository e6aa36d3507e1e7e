//! OpenRouter client implementation

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client};
use tracing::debug;

use crate::llm::core::{
    error::LlmError,
    provider::ChatProvider,
    types::{ChatMessage, ChatRequest},
};

use super::mapper::{error_for_status, from_completion_response, to_completion_request};
use super::types::CompletionResponse;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Connection settings for OpenRouter
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// Bearer token
    pub api_key: String,
    /// API root, without the trailing `/chat/completions`
    pub base_url: String,
    /// Sent as `HTTP-Referer` for OpenRouter app attribution
    pub site_url: String,
    /// Sent as `X-Title`
    pub site_name: String,
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            site_url: "http://localhost:3000".to_string(),
            site_name: "Chat App".to_string(),
        }
    }
}

/// Client for OpenRouter's chat-completions endpoint
pub struct OpenRouterClient {
    /// HTTP client for making requests
    http_client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OpenRouterConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatMessage, LlmError> {
        let body = to_completion_request(request)?;
        debug!(model = %body.model, messages = body.messages.len(), "requesting completion");

        let response = self
            .http_client
            .post(self.endpoint_url())
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.site_url)
            .header("X-Title", &self.config.site_name)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), retry_after.as_deref(), body));
        }

        let completion: CompletionResponse = response.json().await?;
        if let Some(usage) = completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion received"
            );
        }
        from_completion_response(completion)
    }
}
