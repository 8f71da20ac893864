/*!
 * Error types for the subtran library.
 *
 * Each layer of the pipeline has its own error enum built with thiserror.
 * `AppError` sits on top and is what `process_file` and the controller return.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors that can occur while reading, parsing or writing subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The input document could not be read
    #[error("Cannot read subtitle file {}: {source}", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output document could not be written
    #[error("Cannot write subtitle file {}: {source}", path.display())]
    UnwritableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A timestamp did not match `HH:MM:SS,mmm`
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the backend that could not be absorbed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A batch call returned a different number of results than submitted
    #[error("Batch {batch} returned {actual} translations for {expected} inputs")]
    BatchCountMismatch {
        /// Zero-based batch number
        batch: usize,
        /// Number of texts submitted
        expected: usize,
        /// Number of texts returned
        actual: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Invalid or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
