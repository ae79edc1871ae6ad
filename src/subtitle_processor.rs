use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, Context, anyhow};
use log::{error, warn, debug};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;

use crate::errors::CaptionError;

// @module: Caption track parsing, rendering and persistence

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{2,}:\d{2}:\d{2}[,.]\d{3})").unwrap()
});

// @const: HTML-like formatting tags (<i>, </font>, ...)
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[a-zA-Z][^>]*>").unwrap()
});

// @const: SSA override blocks ({\an8}, {\i1}, ...)
static OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\\[^}]*\}").unwrap()
});

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
    let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

    if parts.len() != 4 {
        return Err(anyhow!("Invalid timestamp format: {}", timestamp));
    }

    let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
    let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
    let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
    let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

    if minutes >= 60 || seconds >= 60 || millis >= 1000 {
        return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
    }

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
        .ok_or_else(|| anyhow!("Timestamp out of range: {}", timestamp))
}

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Short clock format for progress messages: `m:ss`, or `h:mm:ss` past the hour
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Remove formatting tags and override blocks from a caption line
pub fn clean_formatting(line: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(line, "");
    OVERRIDE_REGEX.replace_all(&without_tags, "").trim().to_string()
}

/// One timed entry from the source caption track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCaption {
    /// Start time in ms
    pub start_ms: u64,

    /// End time in ms
    pub end_ms: u64,

    /// Text lines; line 0 may carry the speaker
    pub lines: Vec<String>,
}

impl RawCaption {
    // @creates: Validated caption
    // @validates: Positive time range and at least one line
    pub fn new(start_ms: u64, end_ms: u64, lines: Vec<String>) -> Result<Self, CaptionError> {
        if end_ms <= start_ms {
            return Err(CaptionError::InvalidTimeRange { start_ms, end_ms });
        }

        let lines = if lines.is_empty() { vec![String::new()] } else { lines };

        Ok(Self { start_ms, end_ms, lines })
    }

    /// First line of the caption (speaker line by convention)
    pub fn first_line(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or("")
    }
}

/// Final emitted caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCaption {
    /// Global 1-based sequence number
    pub index: usize,

    /// Start time in ms
    pub start_ms: u64,

    /// End time in ms
    pub end_ms: u64,

    /// Speaker of the parent utterance, may be empty
    pub speaker: String,

    /// Word-aligned slice of the translated text
    pub text: String,
}

impl OutputCaption {
    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        format_timestamp(self.start_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        format_timestamp(self.end_ms)
    }
}

impl fmt::Display for OutputCaption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        if !self.speaker.is_empty() {
            writeln!(f, "({})", self.speaker)?;
        }
        // A blank line would end the block early
        let mut lines = self.text.lines().map(str::trim_end).filter(|line| !line.trim().is_empty()).peekable();
        if lines.peek().is_none() {
            writeln!(f)?;
        }
        for line in lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Render captions as an SRT document
pub fn render_srt(captions: &[OutputCaption]) -> String {
    captions.iter().map(|c| c.to_string()).collect()
}

/// Parse SRT format string into raw captions, keeping the line structure
pub fn parse_srt_string(content: &str, strip_formatting: bool) -> Result<Vec<RawCaption>> {
    let mut captions = Vec::new();

    // State variables for parsing
    let mut current_seq_num: Option<usize> = None;
    let mut current_times: Option<(u64, u64)> = None;
    let mut current_lines: Vec<String> = Vec::new();
    let mut skipping_block = false;

    let mut add_current = |seq_num: usize, (start_ms, end_ms): (u64, u64), lines: &mut Vec<String>| {
        let cleaned: Vec<String> = lines
            .drain(..)
            .map(|line| if strip_formatting { clean_formatting(&line) } else { line })
            .filter(|line| !line.is_empty())
            .collect();

        if cleaned.is_empty() {
            warn!("Skipping empty subtitle entry {}", seq_num);
            return;
        }

        match RawCaption::new(start_ms, end_ms, cleaned) {
            Ok(caption) => captions.push(caption),
            Err(e) => warn!("Skipping invalid subtitle entry {}: {}", seq_num, e),
        }
    };

    for (line_number, line) in content.lines().enumerate() {
        let trimmed = line.trim().trim_start_matches('\u{feff}');

        if trimmed.is_empty() {
            skipping_block = false;
            if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
                if current_lines.is_empty() {
                    debug!("Skipping subtitle entry {} with no text", seq_num);
                } else {
                    add_current(seq_num, times, &mut current_lines);
                }
                current_seq_num = None;
                current_times = None;
            }
            continue;
        }

        if skipping_block {
            continue;
        }

        if current_seq_num.is_none() && current_lines.is_empty() {
            if let Ok(num) = trimmed.parse::<usize>() {
                current_seq_num = Some(num);
                continue;
            }
        }

        if current_seq_num.is_some() && current_times.is_none() {
            if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                match (parse_timestamp(&caps[1]), parse_timestamp(&caps[2])) {
                    (Ok(start_ms), Ok(end_ms)) => current_times = Some((start_ms, end_ms)),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Skipping subtitle entry at line {}: {}", line_number + 1, e);
                        current_seq_num = None;
                        skipping_block = true;
                    }
                }
                continue;
            }
        }

        if current_seq_num.is_some() && current_times.is_some() {
            current_lines.push(trimmed.to_string());
        } else {
            warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_number + 1, trimmed);
        }
    }

    if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
        if !current_lines.is_empty() {
            add_current(seq_num, times, &mut current_lines);
        }
    }

    if captions.is_empty() {
        return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
    }

    // Stable sort keeps the track order for identical start times
    captions.sort_by_key(|caption| caption.start_ms);

    Ok(captions)
}

/// Parse an SRT file into raw captions
pub fn parse_srt_file(path: &Path, strip_formatting: bool) -> Result<Vec<RawCaption>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
    parse_srt_string(&content, strip_formatting)
}

/// Extract the default caption track of a media file into an SRT file and parse it
pub async fn extract_from_media(media_path: &Path, output_path: &Path, strip_formatting: bool) -> Result<Vec<RawCaption>> {
    if !media_path.exists() {
        return Err(CaptionError::MissingInput(media_path.to_path_buf()).into());
    }

    let ffmpeg_future = Command::new("ffmpeg")
        .arg("-nostdin")
        .arg("-y")
        .arg("-i")
        .arg(media_path)
        .arg(output_path)
        .output();

    let result = tokio::select! {
        result = ffmpeg_future => {
            result.map_err(|e| anyhow!("Failed to execute ffmpeg command for subtitle extraction: {}", e))?
        },
        _ = tokio::time::sleep(EXTRACTION_TIMEOUT) => {
            return Err(anyhow!("ffmpeg command timed out after {} seconds", EXTRACTION_TIMEOUT.as_secs()));
        }
    };

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let filtered = filter_ffmpeg_stderr(&stderr);
        error!("Subtitle extraction failed: {}", filtered);
        return Err(anyhow!("ffmpeg extraction failed: {}", filtered));
    }

    let file_size = fs::metadata(output_path)?.len();
    if file_size == 0 {
        return Err(anyhow!("Extracted file is empty, no captions found in {:?}", media_path));
    }

    let captions = parse_srt_file(output_path, strip_formatting)?;
    debug!("Extracted {} captions from {:?}", captions.len(), media_path);

    Ok(captions)
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "encoder",
        "handler_name",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Destination for finished captions, fed one utterance at a time
pub trait CaptionSink {
    /// Persist the captions of one utterance before returning
    fn write_captions(&mut self, captions: &[OutputCaption]) -> Result<()>;
}

impl CaptionSink for Vec<OutputCaption> {
    fn write_captions(&mut self, captions: &[OutputCaption]) -> Result<()> {
        self.extend_from_slice(captions);
        Ok(())
    }
}

/// SRT file sink that syncs to disk after every utterance
pub struct SrtSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SrtSink {
    /// Create (or truncate) the output file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = File::create(&path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        Ok(Self { path, writer: BufWriter::new(file) })
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaptionSink for SrtSink {
    fn write_captions(&mut self, captions: &[OutputCaption]) -> Result<()> {
        for caption in captions {
            write!(self.writer, "{}", caption)?;
        }
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
            .with_context(|| format!("Failed to sync subtitle file: {}", self.path.display()))?;
        Ok(())
    }
}
