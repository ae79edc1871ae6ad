use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, Context, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use serde::Deserialize;
use tempfile::TempDir;
use tokio::process::Command;

use crate::app_config::AudioConfig;
use crate::errors::{AppError, CaptionError};
use crate::subtitle_processor::filter_ffmpeg_stderr;

// @module: ffmpeg adapters for audio clipping and subtitle muxing

// @const: Ceiling for a single clip extraction
const CLIP_TIMEOUT: Duration = Duration::from_secs(120);

// @const: Ceiling for the final mux, which copies the whole recording
const MUX_TIMEOUT: Duration = Duration::from_secs(1800);

/// Source of encoded audio for a time range of the recording
#[async_trait]
pub trait AudioClipper: Send + Sync {
    /// Encode `[start_ms, end_ms)` of the source audio
    async fn clip(&self, start_ms: u64, end_ms: u64) -> Result<Bytes, AppError>;

    /// File name to present to the translation service, e.g. `clip.mp3`
    fn file_name(&self) -> String;
}

/// Seconds with millisecond precision, as ffmpeg expects for `-ss`/`-to`
pub fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Run an ffmpeg command with a hard time limit, turning failures into readable errors
async fn run_ffmpeg(command: &mut Command, timeout: Duration, what: &str) -> Result<()> {
    let output = tokio::select! {
        result = command.output() => {
            result.map_err(|e| anyhow!("Failed to execute ffmpeg for {}: {}", what, e))?
        },
        _ = tokio::time::sleep(timeout) => {
            return Err(anyhow!("ffmpeg {} timed out after {} seconds", what, timeout.as_secs()));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let filtered = filter_ffmpeg_stderr(&stderr);
        error!("ffmpeg {} failed: {}", what, filtered);
        return Err(anyhow!("ffmpeg {} failed: {}", what, filtered));
    }

    Ok(())
}

/// Audio clipper backed by the ffmpeg binary
pub struct FfmpegClipper {
    // @field: Recording to cut from
    input: PathBuf,
    // @field: Encoder settings
    audio: AudioConfig,
    // @field: Scratch directory, removed on drop
    scratch: TempDir,
}

impl FfmpegClipper {
    /// Create a clipper for `input`; fails if the file does not exist
    pub fn new<P: AsRef<Path>>(input: P, audio: AudioConfig) -> Result<Self, AppError> {
        let input = input.as_ref().to_path_buf();
        if !input.exists() {
            return Err(CaptionError::MissingInput(input).into());
        }

        let scratch = tempfile::Builder::new()
            .prefix("captrans-")
            .tempdir()
            .map_err(|e| AppError::File(format!("Failed to create scratch directory: {}", e)))?;

        Ok(Self { input, audio, scratch })
    }

    fn clip_path(&self) -> PathBuf {
        self.scratch.path().join(self.file_name())
    }

    /// Arguments for one clip, starting after the program name
    pub fn clip_args(&self, start_ms: u64, end_ms: u64, output: &Path) -> Vec<String> {
        vec![
            "-nostdin".to_string(),
            "-y".to_string(),
            "-ss".to_string(),
            format_seconds(start_ms),
            "-to".to_string(),
            format_seconds(end_ms),
            "-i".to_string(),
            self.input.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-acodec".to_string(),
            self.audio.codec.clone(),
            "-ac".to_string(),
            self.audio.channels.to_string(),
            "-ar".to_string(),
            self.audio.sample_rate.to_string(),
            "-b:a".to_string(),
            self.audio.bitrate.clone(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl AudioClipper for FfmpegClipper {
    async fn clip(&self, start_ms: u64, end_ms: u64) -> Result<Bytes, AppError> {
        if end_ms <= start_ms {
            return Err(CaptionError::InvalidTimeRange { start_ms, end_ms }.into());
        }

        let output = self.clip_path();
        let mut command = Command::new("ffmpeg");
        command.args(self.clip_args(start_ms, end_ms, &output));

        run_ffmpeg(&mut command, CLIP_TIMEOUT, "audio extraction")
            .await
            .map_err(|e| AppError::Media(e.to_string()))?;

        let audio = tokio::fs::read(&output)
            .await
            .map_err(|e| AppError::File(format!("Failed to read clip {}: {}", output.display(), e)))?;

        if audio.is_empty() {
            return Err(AppError::Media(format!(
                "ffmpeg produced an empty clip for {} -> {}",
                format_seconds(start_ms),
                format_seconds(end_ms)
            )));
        }

        debug!("Clipped {} bytes for {} -> {}", audio.len(), format_seconds(start_ms), format_seconds(end_ms));
        Ok(Bytes::from(audio))
    }

    fn file_name(&self) -> String {
        format!("clip.{}", self.audio.extension)
    }
}

// @const: Ceiling for probing the recording's streams
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<serde_json::Value>,
}

/// Number of streams listed in `ffprobe -print_format json -show_streams` output
pub fn stream_count(probe_json: &str) -> Result<usize> {
    if probe_json.trim().is_empty() {
        return Ok(0);
    }

    let probe: ProbeOutput = serde_json::from_str(probe_json)
        .context("Failed to parse ffprobe JSON output")?;
    Ok(probe.streams.len())
}

/// Count the subtitle streams already present in `video`
pub async fn count_subtitle_streams(video: &Path) -> Result<usize> {
    let probe_future = Command::new("ffprobe")
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_streams")
        .arg("-select_streams")
        .arg("s")
        .arg(video)
        .output();

    let output = tokio::select! {
        result = probe_future => {
            result.map_err(|e| anyhow!("Failed to execute ffprobe: {}", e))?
        },
        _ = tokio::time::sleep(PROBE_TIMEOUT) => {
            return Err(anyhow!("ffprobe timed out after {} seconds", PROBE_TIMEOUT.as_secs()));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("ffprobe failed: {}", stderr);
        return Err(anyhow!("ffprobe failed on {}: {}", video.display(), stderr.trim()));
    }

    stream_count(&String::from_utf8_lossy(&output.stdout))
}

/// Arguments that copy the recording's streams and add `srt` as a tagged text track.
///
/// `existing_subtitles` is the number of subtitle streams in `video`; the added
/// track follows them, so its output subtitle index equals that count.
pub fn mux_args(video: &Path, srt: &Path, output: &Path, language: &str, existing_subtitles: usize) -> Vec<String> {
    vec![
        "-nostdin".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-i".to_string(),
        srt.to_string_lossy().to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-c:s".to_string(),
        "mov_text".to_string(),
        "-map".to_string(),
        "0".to_string(),
        "-map".to_string(),
        "1:s:0".to_string(),
        format!("-metadata:s:s:{}", existing_subtitles),
        format!("language={}", language),
        output.to_string_lossy().to_string(),
    ]
}

/// Write a copy of `video` with `srt` attached as a subtitle stream.
///
/// `language` must already be an ISO 639-2/T code.
pub async fn mux_subtitles(video: &Path, srt: &Path, output: &Path, language: &str) -> Result<()> {
    if !video.exists() {
        return Err(CaptionError::MissingInput(video.to_path_buf()).into());
    }
    if !srt.exists() {
        return Err(anyhow!("Subtitle file does not exist: {:?}", srt));
    }

    let existing = count_subtitle_streams(video).await?;
    debug!("{} already has {} subtitle stream(s)", video.display(), existing);

    let mut command = Command::new("ffmpeg");
    command.args(mux_args(video, srt, output, language, existing));

    run_ffmpeg(&mut command, MUX_TIMEOUT, "muxing")
        .await
        .with_context(|| format!("Failed to add subtitles to {}", output.display()))
}
