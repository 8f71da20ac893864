use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::providers::{status_error, transport_error, Provider, RateLimiter};

/// Ollama client for the local generate API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model used for every request
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Client-side pacing
    rate_limiter: RateLimiter,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }
}

impl Ollama {
    /// Create a client for `base_url` (scheme, host and port)
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            // Ollama only speaks HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            model: model.into(),
            temperature: 0.3,
            max_retries: 3,
            backoff_base_ms: 1000,
            rate_limiter: RateLimiter::new(None),
        })
    }

    /// Create a client from the active provider settings
    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        let mut ollama = Self::new(
            config.get_endpoint(),
            config.get_model(),
            Duration::from_secs(config.get_timeout_secs()),
        )?;
        ollama.temperature = config.common.temperature;
        ollama.max_retries = config.common.retry_count;
        ollama.backoff_base_ms = config.common.retry_backoff_ms;
        ollama.rate_limiter = RateLimiter::new(config.get_rate_limit());
        Ok(ollama)
    }

    /// Generate text, retrying server and network errors with exponential backoff
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let mut attempt = 0;

        loop {
            self.rate_limiter.acquire().await;

            let result = match self.client.post(&url).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await.map_err(transport_error)?;
                        return parse_generation_body(&body);
                    }
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    status_error(status, body)
                }
                Err(e) => transport_error(e),
            };

            if !result.is_transient() || attempt >= self.max_retries {
                error!("Ollama API error: {}", result);
                return Err(result);
            }

            attempt += 1;
            warn!(
                "Ollama API error: {} - attempt {}/{}",
                result,
                attempt,
                self.max_retries + 1
            );
            let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Invalid version response: {}", e)))?;

        value["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(&self.model, prompt)
            .system(system_prompt)
            .temperature(self.temperature);

        Ok(self.generate(&request).await?.response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        Ok(())
    }
}

/// Parse a generate body.
///
/// Servers sometimes stream even when asked not to; in that case the body is
/// JSON lines and the `response` fragments are concatenated.
pub fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(response);
    }

    let mut model = String::new();
    let mut text = String::new();
    let mut done = false;
    let mut parsed_lines = 0;

    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        parsed_lines += 1;
        if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
            text.push_str(part);
        }
        if let Some(name) = value.get("model").and_then(|v| v.as_str()) {
            model = name.to_string();
        }
        done |= value.get("done").and_then(|v| v.as_bool()).unwrap_or(false);
    }

    if parsed_lines == 0 {
        let preview: String = body.chars().take(500).collect();
        return Err(ProviderError::ParseError(format!(
            "Ollama response is not JSON: {}",
            preview
        )));
    }

    Ok(GenerationResponse {
        model,
        response: text,
        done,
    })
}
