/*!
 * Core translation orchestration.
 *
 * `SubtitleTranslator` maps the cues of one document through a
 * `TranslationBackend`, either one cue per call or in batches (see `batch`).
 * A failure for a single cue or chunk never stops the document: the original
 * text is kept for that unit and the failure is counted in the report.
 */

use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

use crate::app_config::{BatchMismatchPolicy, ProcessingMode, TranslationCommonConfig};
use crate::errors::{ProviderError, TranslationError};
use crate::providers::TranslationBackend;
use crate::subtitle_processor::SubtitleEntry;

use super::batch::collect_units;
use super::formatting::normalize_cue_text;
use super::chunker::{self, DEFAULT_WORD_LIMIT};

/// Knobs of the translation orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOptions {
    /// Individual or batch submission
    pub mode: ProcessingMode,
    /// Units per batch call
    pub batch_size: usize,
    /// Maximum words per chunk of long text
    pub word_limit: usize,
    /// Texts with more words than this are chunked
    pub chunk_threshold: usize,
    /// Reaction to a batch returning the wrong number of results
    pub mismatch_policy: BatchMismatchPolicy,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Individual,
            batch_size: 5,
            word_limit: DEFAULT_WORD_LIMIT,
            chunk_threshold: DEFAULT_WORD_LIMIT,
            mismatch_policy: BatchMismatchPolicy::Abort,
        }
    }
}

impl From<&TranslationCommonConfig> for TranslationOptions {
    fn from(common: &TranslationCommonConfig) -> Self {
        Self {
            mode: common.processing_mode,
            batch_size: common.batch_size,
            word_limit: common.word_limit,
            chunk_threshold: common.chunk_threshold,
            mismatch_policy: common.batch_mismatch_policy,
        }
    }
}

/// Counters collected while translating one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Cues with text submitted for translation
    pub units: usize,
    /// Units whose translation succeeded
    pub translated: usize,
    /// Units that kept (part of) their original text
    pub failed: usize,
    /// Backend calls made
    pub backend_calls: usize,
    /// Batch calls that returned the wrong number of results
    pub mismatched_batches: usize,
}

/// Progress callback receiving `(done, total)` translation units
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

// Result of translating one text, possibly in several chunks
pub(crate) struct TextOutcome {
    pub text: String,
    pub calls: usize,
    pub failures: usize,
}

/// Translates the cues of a document through a backend
#[derive(Clone)]
pub struct SubtitleTranslator {
    pub(crate) backend: Arc<dyn TranslationBackend>,
    pub(crate) options: TranslationOptions,
    pub(crate) source_language: String,
    pub(crate) target_language: String,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for SubtitleTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubtitleTranslator")
            .field("backend", &self.backend.name())
            .field("options", &self.options)
            .field("source_language", &self.source_language)
            .field("target_language", &self.target_language)
            .finish()
    }
}

impl SubtitleTranslator {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        options: TranslationOptions,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            options,
            source_language: source_language.into(),
            target_language: target_language.into(),
            progress: None,
        }
    }

    /// Report progress through `callback`
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    pub fn backend(&self) -> &Arc<dyn TranslationBackend> {
        &self.backend
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Translate the text of every cue in place.
    ///
    /// Order, count, sequence numbers and timings are never changed. Cues
    /// without text are left untouched. The only error is a batch count
    /// mismatch under `BatchMismatchPolicy::Abort`, in which case no cue has
    /// been modified.
    pub async fn translate_entries(
        &self,
        entries: &mut [SubtitleEntry],
    ) -> Result<TranslationReport, TranslationError> {
        let report = match self.options.mode {
            ProcessingMode::Individual => self.translate_individually(entries).await,
            ProcessingMode::Batch => self.translate_in_batches(entries).await?,
        };

        debug!(
            "{} units: {} translated, {} kept original, {} backend calls",
            report.units, report.translated, report.failed, report.backend_calls
        );
        Ok(report)
    }

    async fn translate_individually(&self, entries: &mut [SubtitleEntry]) -> TranslationReport {
        let units = collect_units(entries);
        let mut report = TranslationReport {
            units: units.len(),
            ..Default::default()
        };

        for (done, unit) in units.iter().enumerate() {
            let outcome = self.translate_text_detailed(&unit.text).await;
            report.backend_calls += outcome.calls;
            if outcome.failures == 0 {
                report.translated += 1;
            } else {
                report.failed += 1;
            }
            entries[unit.position].text = normalize_cue_text(&outcome.text);
            self.report_progress(done + 1, units.len());
        }

        report
    }

    /// Translate free text.
    ///
    /// Text longer than the chunk threshold is split with the chunker, each
    /// chunk is translated on its own and the pieces are joined again. A chunk
    /// whose translation fails keeps its original words.
    pub async fn translate_text(&self, text: &str) -> String {
        self.translate_text_detailed(text).await.text
    }

    pub(crate) async fn translate_text_detailed(&self, text: &str) -> TextOutcome {
        if chunker::word_count(text) <= self.options.chunk_threshold {
            return match self.translate_unit(text).await {
                Ok(translated) => TextOutcome { text: translated, calls: 1, failures: 0 },
                Err(e) => {
                    warn!("Translation failed, keeping original text: {}", e);
                    TextOutcome { text: text.to_string(), calls: 1, failures: 1 }
                }
            };
        }

        let mut chunks = chunker::split_text(text, self.options.word_limit);
        let mut outcome = TextOutcome { text: String::new(), calls: 0, failures: 0 };
        debug!("Split long text into {} chunks", chunks.len());

        for chunk in chunks.iter_mut().filter(|chunk| !chunk.text.is_empty()) {
            outcome.calls += 1;
            match self.translate_unit(&chunk.text).await {
                Ok(translated) => chunk.text = translated,
                Err(e) => {
                    warn!("Chunk translation failed, keeping original words: {}", e);
                    outcome.failures += 1;
                }
            }
        }

        outcome.text = chunker::reassemble(&chunks);
        outcome
    }

    /// One backend call for one text; the best candidate wins
    pub(crate) async fn translate_unit(&self, text: &str) -> Result<String, ProviderError> {
        let candidates = self
            .backend
            .translate(text, &self.source_language, &self.target_language)
            .await?;

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("Backend returned no translation".to_string()))
    }

    pub(crate) fn report_progress(&self, done: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(done, total);
        }
    }
}
