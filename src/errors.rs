/*!
 * Error types for the captrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to a translation provider
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
        message: String
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

/// Errors that can occur while reading captions and grouping them into utterances
#[derive(Error, Debug)]
pub enum CaptionError {
    /// The source media does not exist
    #[error("Input file does not exist: {0:?}")]
    MissingInput(PathBuf),

    /// A caption has no speaker marker although the mode requires one
    #[error("Caption {index} has no speaker marker: {line:?}")]
    MalformedCaption {
        /// 1-based position of the caption in the source track
        index: usize,
        /// The first line of the caption
        line: String,
    },

    /// A caption or utterance does not span a positive duration
    #[error("Invalid time range: end {end_ms}ms <= start {start_ms}ms")]
    InvalidTimeRange {
        /// Start time in milliseconds
        start_ms: u64,
        /// End time in milliseconds
        end_ms: u64,
    },
}

/// Internal resegmentation failures. Seeing one of these means there is a bug.
#[derive(Error, Debug)]
pub enum ResegmentError {
    /// Output spans would overlap, leave a gap, or miss the utterance bounds
    #[error("Resegmentation invariant violated for utterance {utterance}: {reason}")]
    Invariant {
        /// Index of the utterance being resegmented
        utterance: usize,
        /// Which invariant failed
        reason: String,
    },
}

/// Errors that can occur during translation of a single utterance
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The call did not finish inside its time budget
    #[error("Translation of utterance {utterance} timed out after {budget:?} ({attempts} attempt(s))")]
    Timeout {
        /// Index of the utterance
        utterance: usize,
        /// Budget applied to each attempt
        budget: Duration,
        /// Number of attempts made
        attempts: u32,
    },

    /// The provider failed
    #[error("Translation of utterance {utterance} failed after {attempts} attempt(s): {source}")]
    Service {
        /// Index of the utterance
        utterance: usize,
        /// Number of attempts made
        attempts: u32,
        /// Last provider error
        #[source]
        source: ProviderError,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from an external media tool
    #[error("Media error: {0}")]
    Media(String),

    /// Error from caption handling
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Internal resegmentation error
    #[error("Resegmentation error: {0}")]
    Resegment(#[from] ResegmentError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
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
