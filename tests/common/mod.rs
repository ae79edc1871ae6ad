/*!
 * Common test utilities for the captrans test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;

use captrans::errors::AppError;
use captrans::media::AudioClipper;
use captrans::speaker::GroupKey;
use captrans::Utterance;

/// Three captions, two speakers; the first two belong together
pub const MEETING_SRT: &str = "1
00:00:00,000 --> 00:00:02,000
(Ana)
Hi

2
00:00:02,000 --> 00:00:05,000
(Ana)
there

3
00:00:05,000 --> 00:00:07,000
(Bob)
Hey
";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Build an utterance keyed by speaker name
pub fn utterance(index: usize, speaker: &str, start_ms: u64, end_ms: u64) -> Utterance {
    Utterance {
        index,
        speaker: speaker.to_string(),
        key: GroupKey::Speaker(speaker.to_string()),
        start_ms,
        end_ms,
        source_text: String::new(),
    }
}

/// `count` words of the form `w0001`, joined by single spaces
pub fn numbered_words(count: usize) -> String {
    (1..=count).map(|i| format!("w{:04}", i)).collect::<Vec<_>>().join(" ")
}

/// Clipper that returns a tiny fake clip and records the requested ranges
#[derive(Debug, Clone, Default)]
pub struct RecordingClipper {
    ranges: Arc<Mutex<Vec<(u64, u64)>>>,
}

impl RecordingClipper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranges requested so far
    pub fn ranges(&self) -> Vec<(u64, u64)> {
        self.ranges.lock().clone()
    }
}

#[async_trait]
impl AudioClipper for RecordingClipper {
    async fn clip(&self, start_ms: u64, end_ms: u64) -> Result<Bytes, AppError> {
        self.ranges.lock().push((start_ms, end_ms));
        Ok(Bytes::from_static(b"ID3fake"))
    }

    fn file_name(&self) -> String {
        "clip.mp3".to_string()
    }
}
