/*!
 * Tests for error types and conversions
 */

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use captrans::errors::{AppError, CaptionError, ProviderError, ResegmentError, TranslationError};

#[test]
fn test_caption_error_display_shouldNameTheCaption() {
    let error = CaptionError::MalformedCaption { index: 7, line: "Ana:".to_string() };
    let message = error.to_string();
    assert!(message.contains("Caption 7"));
    assert!(message.contains("Ana:"));
}

#[test]
fn test_missing_input_shouldConvertIntoAppError() {
    let error: AppError = CaptionError::MissingInput(PathBuf::from("talk.mp4")).into();
    assert!(matches!(error, AppError::Caption(CaptionError::MissingInput(_))));
    assert!(error.to_string().contains("talk.mp4"));
}

#[test]
fn test_translation_service_error_shouldExposeProviderSource() {
    let error = TranslationError::Service {
        utterance: 3,
        attempts: 2,
        source: ProviderError::RateLimitExceeded("slow down".to_string()),
    };

    let source = error.source().expect("provider error as source");
    assert!(source.to_string().contains("slow down"));
    assert!(error.to_string().contains("utterance 3"));
    assert!(error.to_string().contains("2 attempt"));
}

#[test]
fn test_translation_timeout_display_shouldIncludeBudget() {
    let error = TranslationError::Timeout {
        utterance: 1,
        budget: Duration::from_secs(4),
        attempts: 1,
    };
    assert!(error.to_string().contains("4s"));
}

#[test]
fn test_resegment_error_shouldConvertIntoAppError() {
    let error: AppError = ResegmentError::Invariant { utterance: 2, reason: "gap".to_string() }.into();
    assert!(matches!(error, AppError::Resegment(_)));
}

#[test]
fn test_io_and_anyhow_errors_shouldConvertIntoAppError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(AppError::from(io), AppError::File(_)));
    assert!(matches!(AppError::from(anyhow::anyhow!("odd")), AppError::Unknown(_)));
}

#[test]
fn test_app_error_shouldConvertIntoAnyhowAndDowncast() {
    let error: anyhow::Error = AppError::Media("ffmpeg missing".to_string()).into();
    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::Media(_))));
}
