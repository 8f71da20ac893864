/*!
 * Mock translation backend for testing.
 *
 * Translations are deterministic (`"Hello"` becomes `"[fr] Hello"`), every
 * call is recorded, and failures or malformed answers can be scripted:
 * - `MockProvider::working()` always succeeds
 * - `MockProvider::failing()` always fails
 * - `MockProvider::fail_on_call(n)` fails the n-th call only
 * - `MockProvider::fail_when_contains(s)` fails calls whose input contains `s`
 * - `MockProvider::short_batches()` drops the last result of every batch
 * - `MockProvider::leading_dot()` moves a final period to the front
 * - `MockProvider::blank_lines()` answers with paragraphs separated by blank lines
 * - `MockProvider::candidates(n)` returns n candidates per text
 * - `MockProvider::no_candidates()` returns an empty candidate list
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::TranslationBackend;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a tagged translation
    Working,
    /// Always fails with an API error
    Failing,
    /// Fails only the n-th call (1-based, single and batch calls counted together)
    FailOnCall(usize),
    /// Fails any call whose input contains the given text
    FailWhenContains(String),
    /// Batch calls return one result fewer than submitted
    DropLastInBatch,
    /// Moves a trailing '.' of the source to the front of the translation
    LeadingDot,
    /// Appends a blank line and a second paragraph to every translation
    BlankLines,
    /// Single calls return this many candidates
    Candidates(usize),
    /// Single calls return no candidate at all
    NoCandidates,
}

/// Kind of recorded call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCallKind {
    Single,
    Batch,
}

/// A recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub kind: MockCallKind,
    pub texts: Vec<String>,
}

/// Mock backend; clones share call history and counters
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    delay: Option<Duration>,
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_on_call(call: usize) -> Self {
        Self::new(MockBehavior::FailOnCall(call))
    }

    pub fn fail_when_contains(needle: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailWhenContains(needle.into()))
    }

    pub fn short_batches() -> Self {
        Self::new(MockBehavior::DropLastInBatch)
    }

    pub fn leading_dot() -> Self {
        Self::new(MockBehavior::LeadingDot)
    }

    pub fn blank_lines() -> Self {
        Self::new(MockBehavior::BlankLines)
    }

    pub fn candidates(count: usize) -> Self {
        Self::new(MockBehavior::Candidates(count))
    }

    pub fn no_candidates() -> Self {
        Self::new(MockBehavior::NoCandidates)
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Sizes of the batch calls received so far
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.kind == MockCallKind::Batch)
            .map(|call| call.texts.len())
            .collect()
    }

    /// Highest number of calls that were running at the same time
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// The translation this mock produces for `text`
    pub fn expected_translation(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }

    fn render(&self, text: &str, target_language: &str) -> String {
        match (&self.behavior, text.strip_suffix('.')) {
            (MockBehavior::LeadingDot, Some(body)) => {
                format!(".{}", Self::expected_translation(body, target_language))
            }
            (MockBehavior::BlankLines, _) => {
                format!("{}\n\n \nsecond paragraph\n", Self::expected_translation(text, target_language))
            }
            _ => Self::expected_translation(text, target_language),
        }
    }

    async fn begin(&self, kind: MockCallKind, texts: &[String]) -> Result<(), ProviderError> {
        let call_number = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().push(MockCall {
            kind,
            texts: texts.to_vec(),
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fail = match &self.behavior {
            MockBehavior::Failing => true,
            MockBehavior::FailOnCall(n) => *n == call_number,
            MockBehavior::FailWhenContains(needle) => texts.iter().any(|t| t.contains(needle.as_str())),
            _ => false,
        };

        if fail {
            Err(ProviderError::ApiError {
                status_code: 500,
                message: format!("Simulated failure on call {}", call_number),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TranslationBackend for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.begin(MockCallKind::Single, &[text.to_string()]).await?;

        let best = self.render(text, target_language);
        Ok(match self.behavior {
            MockBehavior::NoCandidates => Vec::new(),
            MockBehavior::Candidates(count) => (0..count.max(1))
                .map(|i| if i == 0 { best.clone() } else { format!("{} (alt {})", best, i) })
                .collect(),
            _ => vec![best],
        })
    }

    async fn batch_translate(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.begin(MockCallKind::Batch, texts).await?;

        let mut results: Vec<String> = texts
            .iter()
            .map(|text| self.render(text, target_language))
            .collect();
        if self.behavior == MockBehavior::DropLastInBatch {
            results.pop();
        }
        Ok(results)
    }
}
