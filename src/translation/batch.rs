/*!
 * Batch translation processing.
 *
 * Units are sent in consecutive groups of `batch_size`. Results are collected
 * in unit order and written back to their cues only once every batch has been
 * handled, so an aborted document leaves its cues unchanged.
 */

use log::{error, warn};

use crate::app_config::BatchMismatchPolicy;
use crate::errors::TranslationError;
use crate::subtitle_processor::SubtitleEntry;

use super::core::{SubtitleTranslator, TranslationReport};
use super::formatting::{fix_leading_dot, normalize_cue_text};

/// Text of one cue submitted for translation, with the cue's position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Index of the cue in the document
    pub position: usize,
    /// Text to translate
    pub text: String,
}

/// Units for every cue that has text, in document order
pub fn collect_units(entries: &[SubtitleEntry]) -> Vec<TranslationUnit> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.text.is_empty())
        .map(|(position, entry)| TranslationUnit {
            position,
            text: entry.text.clone(),
        })
        .collect()
}

impl SubtitleTranslator {
    pub(crate) async fn translate_in_batches(
        &self,
        entries: &mut [SubtitleEntry],
    ) -> Result<TranslationReport, TranslationError> {
        let units = collect_units(entries);
        let mut report = TranslationReport {
            units: units.len(),
            ..Default::default()
        };
        let mut results: Vec<String> = Vec::with_capacity(units.len());

        for (batch_index, batch) in units.chunks(self.options.batch_size.max(1)).enumerate() {
            let texts: Vec<String> = batch.iter().map(|unit| unit.text.clone()).collect();
            report.backend_calls += 1;

            match self
                .backend
                .batch_translate(&texts, &self.source_language, &self.target_language)
                .await
            {
                Ok(translated) if translated.len() == texts.len() => {
                    results.extend(translated.iter().map(|text| fix_leading_dot(text)));
                    report.translated += texts.len();
                }
                Ok(translated) => {
                    report.mismatched_batches += 1;
                    let mismatch = TranslationError::BatchCountMismatch {
                        batch: batch_index,
                        expected: texts.len(),
                        actual: translated.len(),
                    };

                    match self.options.mismatch_policy {
                        BatchMismatchPolicy::Abort => {
                            error!("{}", mismatch);
                            return Err(mismatch);
                        }
                        BatchMismatchPolicy::RetryIndividually => {
                            warn!("{}, retrying its units one by one", mismatch);
                            self.retry_individually(&texts, &mut results, &mut report).await;
                        }
                    }
                }
                Err(e) => {
                    warn!("Batch {} failed, keeping original text: {}", batch_index, e);
                    report.failed += texts.len();
                    results.extend(texts);
                }
            }

            self.report_progress(results.len(), units.len());
        }

        for (unit, text) in units.iter().zip(results) {
            entries[unit.position].text = normalize_cue_text(&text);
        }

        Ok(report)
    }

    /// Translate several free texts with one batch call.
    ///
    /// Results come back in input order. A short or long answer is an error
    /// here since there is no cue to fall back to.
    pub async fn translate_texts(&self, texts: &[String]) -> Result<Vec<String>, TranslationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let translated = self
            .backend
            .batch_translate(texts, &self.source_language, &self.target_language)
            .await?;
        if translated.len() != texts.len() {
            return Err(TranslationError::BatchCountMismatch {
                batch: 0,
                expected: texts.len(),
                actual: translated.len(),
            });
        }

        Ok(translated.iter().map(|text| fix_leading_dot(text)).collect())
    }

    async fn retry_individually(
        &self,
        texts: &[String],
        results: &mut Vec<String>,
        report: &mut TranslationReport,
    ) {
        for text in texts {
            report.backend_calls += 1;
            match self.translate_unit(text).await {
                Ok(translated) => {
                    results.push(fix_leading_dot(&translated));
                    report.translated += 1;
                }
                Err(e) => {
                    warn!("Translation failed, keeping original text: {}", e);
                    results.push(text.clone());
                    report.failed += 1;
                }
            }
        }
    }
}
