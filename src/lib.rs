/*!
 * # subtran - subtitle translation pipeline
 *
 * Translates SRT subtitle files through a pluggable translation backend
 * while keeping cue order, count, numbering and timing intact.
 *
 * ## Pipeline
 *
 * 1. `subtitle_processor` parses the document into cues
 * 2. `translation` maps cue text through a backend, one cue at a time or in
 *    batches, chunking long text with `translation::chunker`
 * 3. `subtitle_processor` serializes the cues and writes them atomically
 *
 * `app_controller::process_file` runs the three steps for one document.
 *
 * ## Modules
 *
 * - `app_config`: JSON configuration
 * - `app_controller`: single file, folder and background processing
 * - `providers`: the `TranslationBackend` trait, Ollama and Anthropic
 *   backends, and a mock backend for tests
 * - `language_utils`: ISO 639 language code helpers
 * - `file_utils`: file discovery and atomic writes
 * - `errors`: error types
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

pub use app_config::Config;
pub use app_controller::{process_file, Controller, DocumentReport, DocumentStatus};
pub use errors::{AppError, ProviderError, SubtitleError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::{create_backend, TranslationBackend};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry, TimeRange, Timestamp};
pub use translation::{SubtitleTranslator, TranslationOptions, TranslationReport};
