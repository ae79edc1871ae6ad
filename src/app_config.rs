use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

use crate::speaker::SpeakerMode;
use crate::timing::TimeoutPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Translation service config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Caption grouping and resegmentation config
    #[serde(default)]
    pub captions: CaptionConfig,

    /// Audio clip encoding config
    #[serde(default)]
    pub audio: AudioConfig,

    /// Output config
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: API key, falls back to $OPENAI_API_KEY when empty
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Budget multiplier applied to the utterance duration
    #[serde(default = "default_timeout_ratio")]
    pub timeout_ratio: f64,

    /// Upper bound for a single translation call, in seconds
    #[serde(default = "default_max_timeout_secs")]
    pub max_timeout_secs: f64,

    /// Retry count for failed or timed out calls (0 = fail on first error)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_ratio: default_timeout_ratio(),
            max_timeout_secs: default_max_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl TranslationConfig {
    /// Get the API key, preferring the config value over the environment
    pub fn get_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }

        std::env::var(API_KEY_ENV).unwrap_or_default()
    }

    /// Timeout policy derived from the configured ratio and ceiling
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new(self.timeout_ratio, self.max_timeout_secs)
    }
}

/// Caption grouping and resegmentation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptionConfig {
    /// How speakers are read from the raw captions
    #[serde(default)]
    pub speaker_mode: SpeakerMode,

    /// Target maximum characters per output caption
    #[serde(default = "default_max_caption_length")]
    pub max_caption_length: usize,

    /// Strip formatting tags from the extracted captions
    #[serde(default = "default_true")]
    pub strip_formatting: bool,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            speaker_mode: SpeakerMode::default(),
            max_caption_length: default_max_caption_length(),
            strip_formatting: true,
        }
    }
}

/// Audio clip encoding sent to the translation service
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    /// ffmpeg audio codec
    #[serde(default = "default_audio_codec")]
    pub codec: String,

    /// Output file extension matching the codec
    #[serde(default = "default_audio_extension")]
    pub extension: String,

    /// Channel count
    #[serde(default = "default_channels")]
    pub channels: u32,

    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Bitrate in ffmpeg notation
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            codec: default_audio_codec(),
            extension: default_audio_extension(),
            channels: default_channels(),
            sample_rate: default_sample_rate(),
            bitrate: default_bitrate(),
        }
    }
}

/// Output settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// Mux the translated track into a copy of the video
    #[serde(default = "default_true")]
    pub mux_video: bool,

    /// Language tag written on the muxed subtitle stream
    #[serde(default = "default_subtitle_language")]
    pub subtitle_language: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mux_video: true,
            subtitle_language: default_subtitle_language(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

fn default_model() -> String {
    "whisper-1".to_string()
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_ratio() -> f64 {
    2.0 // give the call twice as long as the audio lasts
}

fn default_max_timeout_secs() -> f64 {
    30.0
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_max_caption_length() -> usize {
    900
}

fn default_audio_codec() -> String {
    "libmp3lame".to_string()
}

fn default_audio_extension() -> String {
    "mp3".to_string()
}

fn default_channels() -> u32 {
    1
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_bitrate() -> String {
    "128k".to_string()
}

fn default_subtitle_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required (set translation.api_key or ${})",
                API_KEY_ENV
            ));
        }

        Url::parse(&self.translation.endpoint)
            .map_err(|e| anyhow!("Invalid endpoint '{}': {}", self.translation.endpoint, e))?;

        self.validate_without_credentials()
    }

    /// Validate everything except credentials and the endpoint
    pub fn validate_without_credentials(&self) -> Result<()> {
        let ratio = self.translation.timeout_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(anyhow!("timeout_ratio must be a positive number, got {}", ratio));
        }

        let max = self.translation.max_timeout_secs;
        if !max.is_finite() || max <= 0.0 {
            return Err(anyhow!("max_timeout_secs must be a positive number, got {}", max));
        }

        if self.captions.max_caption_length == 0 {
            return Err(anyhow!("max_caption_length must be greater than zero"));
        }

        if self.audio.channels == 0 || self.audio.sample_rate == 0 {
            return Err(anyhow!("Audio channels and sample rate must be greater than zero"));
        }

        if self.output.mux_video {
            crate::language_utils::normalize_to_part2t(&self.output.subtitle_language)?;
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            translation: TranslationConfig::default(),
            captions: CaptionConfig::default(),
            audio: AudioConfig::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
