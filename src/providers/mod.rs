/*!
 * Translation backends.
 *
 * The translation pipeline only knows the `TranslationBackend` trait. Concrete
 * backends:
 * - `LlmBackend<Ollama>`: local Ollama server
 * - `LlmBackend<Anthropic>`: Anthropic messages API
 * - `mock::MockProvider`: scriptable backend for tests
 *
 * `create_backend` picks the implementation from the configured provider tag.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;
use crate::language_utils;

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod prompts;

use self::anthropic::Anthropic;
use self::ollama::Ollama;

/// Contract every translation backend fulfils.
///
/// Language arguments are whatever the caller configured (usually ISO codes);
/// backends interpret them as they see fit.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Translate one text. Returns one or more candidates, best first.
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Translate several texts in one call.
    ///
    /// A well behaved backend returns exactly one string per input, in order.
    /// Callers must check the count.
    async fn batch_translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Check that the backend is reachable
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// A chat/completion style LLM endpoint
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete `prompt` under `system_prompt` and return the generated text
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Translation backend driving an LLM through prompts
#[derive(Debug)]
pub struct LlmBackend<P: Provider> {
    name: String,
    provider: P,
    system_prompt: String,
}

impl<P: Provider> LlmBackend<P> {
    pub fn new(name: impl Into<String>, provider: P, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider,
            system_prompt: system_prompt.into(),
        }
    }

    fn system_prompt_for(&self, source_language: &str, target_language: &str) -> String {
        prompts::render_system_prompt(
            &self.system_prompt,
            &language_utils::display_name(source_language),
            &language_utils::display_name(target_language),
        )
    }
}

#[async_trait]
impl<P: Provider> TranslationBackend for LlmBackend<P> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let system = self.system_prompt_for(source_language, target_language);
        let response = self.provider.complete(&system, text).await?;
        Ok(vec![prompts::clean_single_response(&response)])
    }

    async fn batch_translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let system = format!(
            "{}\n\n{}",
            self.system_prompt_for(source_language, target_language),
            prompts::BATCH_INSTRUCTIONS
        );
        let response = self
            .provider
            .complete(&system, &prompts::encode_batch(texts))
            .await?;

        Ok(prompts::decode_batch(&response, texts.len()))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }
}

/// Wraps a backend that must not receive overlapping calls.
///
/// Each call holds the gate for its whole duration; the guard is released when
/// the call returns, including on error.
#[derive(Debug)]
pub struct SerializedBackend {
    inner: Arc<dyn TranslationBackend>,
    gate: tokio::sync::Mutex<()>,
}

impl SerializedBackend {
    pub fn new(inner: Arc<dyn TranslationBackend>) -> Self {
        Self {
            inner,
            gate: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl TranslationBackend for SerializedBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let _guard = self.gate.lock().await;
        self.inner.translate(text, source_language, target_language).await
    }

    async fn batch_translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let _guard = self.gate.lock().await;
        self.inner
            .batch_translate(texts, source_language, target_language)
            .await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let _guard = self.gate.lock().await;
        self.inner.test_connection().await
    }
}

/// Build the backend selected by `config.provider`
pub fn create_backend(config: &TranslationConfig) -> Result<Arc<dyn TranslationBackend>, ProviderError> {
    let system_prompt = config.common.system_prompt.clone();

    let backend: Arc<dyn TranslationBackend> = match config.provider {
        TranslationProvider::Ollama => Arc::new(LlmBackend::new(
            config.provider.to_lowercase_string(),
            Ollama::from_config(config)?,
            system_prompt,
        )),
        TranslationProvider::Anthropic => Arc::new(LlmBackend::new(
            config.provider.to_lowercase_string(),
            Anthropic::from_config(config)?,
            system_prompt,
        )),
    };

    if config.serialize_requests() {
        Ok(Arc::new(SerializedBackend::new(backend)))
    } else {
        Ok(backend)
    }
}

/// Client-side request pacing (requests per minute)
#[derive(Debug)]
pub(crate) struct RateLimiter {
    interval: Option<Duration>,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub(crate) fn new(requests_per_minute: Option<u32>) -> Self {
        let interval = requests_per_minute
            .filter(|rpm| *rpm > 0)
            .map(|rpm| Duration::from_millis(60_000 / u64::from(rpm)));

        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until the next request is allowed
    pub(crate) async fn acquire(&self) {
        let Some(interval) = self.interval else {
            return;
        };

        let wait = {
            let mut next_slot = self.next_slot.lock();
            let now = Instant::now();
            let slot = next_slot.map_or(now, |slot| slot.max(now));
            *next_slot = Some(slot + interval);
            slot - now
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        code => ProviderError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

/// Map a transport failure to a provider error
pub(crate) fn transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}
