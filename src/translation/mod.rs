/*!
 * Translation of subtitle documents.
 *
 * - `core`: the `SubtitleTranslator` orchestrator and individual mode
 * - `batch`: batch mode and translation units
 * - `chunker`: word-bounded splitting of long text
 * - `formatting`: tag stripping and output fix-ups
 */

pub use self::batch::TranslationUnit;
pub use self::chunker::{reassemble, split_text, TextChunk};
pub use self::core::{SubtitleTranslator, TranslationOptions, TranslationReport};

pub mod batch;
pub mod chunker;
pub mod core;
pub mod formatting;
