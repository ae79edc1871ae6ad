/*!
 * Tests for application configuration
 */

use captrans::app_config::{Config, LogLevel};
use captrans::speaker::SpeakerMode;
use std::time::Duration;

#[test]
fn test_default_config_shouldValidateWithoutCredentials() {
    let config = Config::default();
    assert!(config.validate_without_credentials().is_ok());
    assert_eq!(config.translation.model, "whisper-1");
    assert_eq!(config.translation.retry_count, 2);
    assert_eq!(config.captions.speaker_mode, SpeakerMode::Marker);
    assert!(config.output.mux_video);
}

#[test]
fn test_config_serialization_shouldRoundTripThroughJson() {
    let mut config = Config::default();
    config.captions.speaker_mode = SpeakerMode::FirstLine;
    config.translation.retry_count = 5;
    config.log_level = LogLevel::Trace;

    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.captions.speaker_mode, SpeakerMode::FirstLine);
    assert_eq!(parsed.translation.retry_count, 5);
    assert_eq!(parsed.log_level, LogLevel::Trace);
    assert!(json.contains("\"first-line\""));
}

#[test]
fn test_empty_json_shouldUseDefaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.translation.timeout_ratio, 2.0);
    assert_eq!(config.audio.codec, "libmp3lame");
    assert_eq!(config.output.subtitle_language, "en");
}

#[test]
fn test_timeout_policy_fromConfig_shouldUseConfiguredValues() {
    let mut config = Config::default();
    config.translation.timeout_ratio = 1.5;
    config.translation.max_timeout_secs = 10.0;

    let policy = config.translation.timeout_policy();
    assert_eq!(policy.budget(2_000), Duration::from_secs(3));
    assert_eq!(policy.budget(60_000), Duration::from_secs(10));
}

#[test]
fn test_validate_withInvalidLanguageAndMuxing_shouldFail() {
    let mut config = Config::default();
    config.output.subtitle_language = "klingon".to_string();
    assert!(config.validate_without_credentials().is_err());

    // The tag is irrelevant when no video is written
    config.output.mux_video = false;
    assert!(config.validate_without_credentials().is_ok());
}

#[test]
fn test_validate_withBadEndpoint_shouldFail() {
    let mut config = Config::default();
    config.translation.api_key = "sk-test".to_string();
    config.translation.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withNonFiniteTimeout_shouldFail() {
    let mut config = Config::default();
    config.translation.max_timeout_secs = f64::INFINITY;
    assert!(config.validate_without_credentials().is_err());
}
