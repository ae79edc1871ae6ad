use anyhow::{Result, Context};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

// @const: First SRT entry header (sequence number, then a timing line)
static SRT_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*\r?\n\d{2,}:\d{2}:\d{2}[,.]\d{3}\s+-->\s+\d{2,}:\d{2}:\d{2}[,.]\d{3}").unwrap()
});

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Append `suffix` to the full file name, keeping the original extension.
    ///
    /// `talk.mp4` with `.srt` becomes `talk.mp4.srt`.
    pub fn with_appended_suffix<P: AsRef<Path>>(input: P, suffix: &str) -> PathBuf {
        let mut name = input.as_ref().as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    // @generates: Translated caption track next to the input
    pub fn subtitle_output_path<P: AsRef<Path>>(input: P) -> PathBuf {
        Self::with_appended_suffix(input, ".srt")
    }

    // @generates: Staging file written until the run completes
    pub fn partial_output_path<P: AsRef<Path>>(output: P) -> PathBuf {
        Self::with_appended_suffix(output, ".partial")
    }

    // @generates: Muxed video next to the input
    pub fn translated_video_path<P: AsRef<Path>>(input: P) -> PathBuf {
        Self::with_appended_suffix(input, ".translated.mp4")
    }

    // @generates: Scratch path for the extracted source captions
    pub fn extracted_captions_path<P1: AsRef<Path>, P2: AsRef<Path>>(scratch_dir: P1, input: P2) -> PathBuf {
        let base = input.as_ref()
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());
        scratch_dir.as_ref().join(format!("{}.source.srt", base))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Detect if a file is a subtitle file (SRT) or a media file ffmpeg can read
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();

            if ext_str == "srt" {
                return Ok(FileType::Subtitle);
            }

            // Not exhaustive; anything else falls through to a content check
            let media_extensions = [
                "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v",
                "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
            ];

            if media_extensions.contains(&ext_str.as_str()) {
                return Ok(FileType::Media);
            }
        }

        if let Ok(content) = fs::read_to_string(path) {
            if SRT_HEADER_REGEX.is_match(&content) {
                return Ok(FileType::Subtitle);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Subtitle file (SRT)
    Subtitle,
    /// Video or audio container
    Media,
    /// Unknown file type
    Unknown,
}
