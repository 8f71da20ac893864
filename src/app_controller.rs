use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::app_config::Config;
use crate::errors::{AppError, TranslationError};
use crate::file_utils::FileManager;
use crate::providers::{create_backend, TranslationBackend};
use crate::subtitle_processor::SubtitleCollection;
use crate::translation::{SubtitleTranslator, TranslationOptions, TranslationReport};

// @module: Application controller for subtitle processing

/// Whether the input document contained any cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Cues were found and sent through the translator
    Translated,
    /// The document had no parsable cue; an empty output was written
    Empty,
}

/// Result of processing one document
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub cues: usize,
    pub status: DocumentStatus,
    pub translation: TranslationReport,
}

/// Counters of a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Read, parse, translate and write one subtitle document.
///
/// Unreadable input and unwritable output are errors. A document without cues
/// is not: it produces an empty output and `DocumentStatus::Empty`.
pub async fn process_file(
    input_path: &Path,
    output_path: &Path,
    translator: &SubtitleTranslator,
) -> Result<DocumentReport, AppError> {
    let mut collection = SubtitleCollection::read_srt_file(input_path)?;

    let status = if collection.entries.is_empty() {
        warn!("No subtitle entries found in {}", input_path.display());
        DocumentStatus::Empty
    } else {
        DocumentStatus::Translated
    };

    let translation = translator.translate_entries(&mut collection.entries).await?;
    collection.write_to_srt(output_path)?;

    Ok(DocumentReport {
        input: input_path.to_path_buf(),
        output: output_path.to_path_buf(),
        cues: collection.entries.len(),
        status,
        translation,
    })
}

/// A document being translated in the background
#[derive(Debug)]
pub struct PendingDocument {
    /// Where the translated document will be written
    pub output_path: PathBuf,
    /// File name of the output, unique per request
    pub download_name: String,
    handle: JoinHandle<Result<DocumentReport, AppError>>,
}

impl PendingDocument {
    /// Wait for the background task to finish
    pub async fn wait(self) -> Result<DocumentReport, AppError> {
        self.handle
            .await
            .map_err(|e| AppError::Unknown(format!("Background translation task failed: {}", e)))?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Main application controller for subtitle translation
#[derive(Clone)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Backend shared by every document
    backend: Arc<dyn TranslationBackend>,
    // @field: Draw progress bars
    show_progress: bool,
}

impl Controller {
    // @method: Create a controller with the backend named by the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let backend = create_backend(&config.translation)
            .context("Failed to create translation backend")?;

        Ok(Self {
            config,
            backend,
            show_progress: true,
        })
    }

    // @method: Create a controller around an existing backend
    pub fn with_backend(config: Config, backend: Arc<dyn TranslationBackend>) -> Self {
        Self {
            config,
            backend,
            show_progress: false,
        }
    }

    pub fn with_progress_bars(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A translator configured for this controller's languages and options
    pub fn translator(&self) -> SubtitleTranslator {
        SubtitleTranslator::new(
            Arc::clone(&self.backend),
            TranslationOptions::from(&self.config.translation.common),
            self.config.source_language.clone(),
            self.config.target_language.clone(),
        )
    }

    /// Check that the backend answers
    pub async fn test_connection(&self) -> Result<()> {
        self.backend
            .test_connection()
            .await
            .with_context(|| format!("Cannot reach {} backend", self.backend.name()))
    }

    /// Default output location for `input_file`
    pub fn output_path_for(&self, input_file: &Path, output: Option<&Path>) -> PathBuf {
        match output {
            Some(path) if !FileManager::dir_exists(path) => path.to_path_buf(),
            Some(dir) => FileManager::generate_output_path(input_file, dir, &self.config.target_language),
            None => {
                let dir = input_file.parent().unwrap_or_else(|| Path::new("."));
                FileManager::generate_output_path(input_file, dir, &self.config.target_language)
            }
        }
    }

    /// Translate one file. Returns `None` when the output exists and
    /// `force_overwrite` is not set.
    pub async fn run(
        &self,
        input_file: PathBuf,
        output: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<Option<DocumentReport>> {
        let start_time = Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = self.output_path_for(&input_file, output.as_deref());
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(None);
        }

        info!(
            "Translating {} with {} ({} -> {})",
            input_file.display(),
            self.backend.name(),
            self.config.source_language,
            self.config.target_language
        );

        let mut translator = self.translator();
        let progress_bar = self.progress_bar(0, "subtitles");
        if let Some(pb) = progress_bar.clone() {
            translator = translator.with_progress(move |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            });
        }

        let report = process_file(&input_file, &output_path, &translator).await;
        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }
        let report = report?;

        Self::log_report(&report);
        info!(
            "Success: {} ({})",
            report.output.display(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(Some(report))
    }

    /// Translate every `.srt` file below `input_dir`, next to its source.
    ///
    /// Files that are themselves translations into the target language are
    /// ignored, and existing outputs are skipped unless `force_overwrite`.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let target_language = &self.config.target_language;
        let mut summary = FolderSummary::default();
        let mut jobs = Vec::new();

        for input in FileManager::find_files(&input_dir, "srt")? {
            if FileManager::is_translation_output(&input, target_language) {
                continue;
            }
            let output = self.output_path_for(&input, None);
            if output.exists() && !force_overwrite {
                warn!("Skipping {}, translation already exists", input.display());
                summary.skipped += 1;
                continue;
            }
            jobs.push((input, output));
        }

        if jobs.is_empty() && summary.skipped == 0 {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        let folder_pb = self.progress_bar(jobs.len() as u64, "files");
        let concurrency = self.config.translation.common.concurrent_documents.max(1);
        let translator = self.translator();

        let results = stream::iter(jobs)
            .map(|(input, output)| {
                let translator = translator.clone();
                let folder_pb = folder_pb.clone();
                async move {
                    let result = process_file(&input, &output, &translator).await;
                    if let Some(pb) = folder_pb {
                        pb.inc(1);
                    }
                    (input, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        if let Some(pb) = folder_pb {
            pb.finish_with_message("Folder processing complete");
        }

        for (input, result) in results {
            match result {
                Ok(report) => {
                    Self::log_report(&report);
                    summary.processed += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {}", input.display(), e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors ({})",
            summary.processed,
            summary.skipped,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    /// Start translating `input_file` in the background.
    ///
    /// Returns immediately with the location the result will be written to,
    /// a fresh `<uuid>.srt` inside `output_dir`.
    pub fn spawn_document(&self, input_file: PathBuf, output_dir: &Path) -> PendingDocument {
        let download_name = format!("{}.srt", Uuid::new_v4());
        let output_path = output_dir.join(&download_name);
        let translator = self.translator();

        let task_output = output_path.clone();
        let handle = tokio::spawn(async move {
            let result = process_file(&input_file, &task_output, &translator).await;
            if let Err(e) = &result {
                error!("Background translation of {} failed: {}", input_file.display(), e);
            }
            result
        });

        PendingDocument {
            output_path,
            download_name,
            handle,
        }
    }

    /// Translate free text, chunking it when it is long
    pub async fn translate_free_text(&self, text: &str) -> String {
        self.translator().translate_text(text).await
    }

    /// Translate several short texts in a single backend call
    pub async fn translate_free_texts(&self, texts: &[String]) -> Result<Vec<String>, TranslationError> {
        self.translator().translate_texts(texts).await
    }

    fn progress_bar(&self, length: u64, unit: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(length);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style.progress_chars("█▓▒░"));
        Some(pb)
    }

    fn log_report(report: &DocumentReport) {
        match report.status {
            DocumentStatus::Empty => warn!("{}: no subtitles found, wrote empty output", report.input.display()),
            DocumentStatus::Translated if report.translation.failed > 0 => warn!(
                "{}: {} of {} subtitles kept their original text",
                report.input.display(),
                report.translation.failed,
                report.translation.units
            ),
            DocumentStatus::Translated => info!(
                "{}: translated {} subtitles",
                report.input.display(),
                report.translation.translated
            ),
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
