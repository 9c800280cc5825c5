//! HTTP adapter for the Messages API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Response, StatusCode};
use tracing::{debug, info, instrument, warn};

use crate::domain::models::config::{ApiConfig, RetryConfig};
use crate::domain::ports::{Completion, CompletionClient, CompletionRequest};

use super::error::ClaudeApiError;
use super::retry::RetryPolicy;
use super::types::{Message, MessageRequest, MessageResponse};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for the Claude HTTP client
#[derive(Debug, Clone)]
pub struct ClaudeClientConfig {
    /// Anthropic API key
    pub api_key: String,

    /// Base URL for the Messages API
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retry policy configuration
    pub retry: RetryConfig,
}

impl ClaudeClientConfig {
    /// Build a client config from the application config, taking the API
    /// key from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env(api: &ApiConfig, retry: &RetryConfig) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable must be set")?;
        Ok(Self {
            api_key,
            base_url: api.base_url.clone(),
            timeout_secs: api.timeout_secs,
            retry: retry.clone(),
        })
    }
}

/// HTTP client for the Messages API.
///
/// One instance is shared by the generation and judgment roles; requests
/// differ only in model and sampling parameters. Transient failures are
/// retried per class by the [`RetryPolicy`]; anything else propagates to
/// the caller and aborts the run.
pub struct ClaudeClient {
    http_client: ReqwestClient,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl ClaudeClient {
    pub fn new(config: ClaudeClientConfig) -> Result<Self, ClaudeApiError> {
        // Scrub the API key from logs
        let api_key_scrubbed = if config.api_key.len() > 8 {
            format!("{}...[REDACTED]", &config.api_key[..8])
        } else {
            "[REDACTED]".to_string()
        };
        info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            api_key = %api_key_scrubbed,
            "initializing Claude API client"
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| ClaudeApiError::InvalidRequest(format!("Invalid API key: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()
            .map_err(ClaudeApiError::NetworkError)?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
            retry_policy: RetryPolicy::from_config(&config.retry),
        })
    }

    /// Execute a single message request (called by the retry policy).
    async fn execute_message_request(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, ClaudeApiError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(%url, model = %request.model, "POST");

        let response = self.http_client.post(&url).json(request).send().await?;
        self.handle_response(response).await
    }

    async fn handle_response(
        &self,
        response: Response,
    ) -> Result<MessageResponse, ClaudeApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_error_response(status, response).await);
        }

        let message_response: MessageResponse = response.json().await?;
        Ok(message_response)
    }

    async fn handle_error_response(
        &self,
        status: StatusCode,
        response: Response,
    ) -> ClaudeApiError {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        warn!(%status, %body, "API error");
        ClaudeApiError::from_status(status, body)
    }
}

#[async_trait]
impl CompletionClient for ClaudeClient {
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let wire_request = MessageRequest {
            model: request.model,
            messages: vec![Message::user(request.user)],
            max_tokens: request.max_tokens,
            system: Some(request.system),
            temperature: Some(request.temperature),
        };

        let response = self
            .retry_policy
            .execute(|| self.execute_message_request(&wire_request))
            .await
            .context("Messages API request failed")?;

        info!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "message request succeeded"
        );

        Ok(Completion {
            text: response.text(),
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }
}
