/*!
 * Speaker attribution for raw captions.
 *
 * Caption tracks exported by meeting recorders put the talker on the
 * first line, usually as a parenthesized marker such as `(Ana)`. This
 * module turns that convention into a typed grouping key.
 *
 * Marker grammar: `"(" NAME ")"` starting at the first byte of line 0.
 * NAME is trimmed, must be non-empty and may not contain parentheses.
 * Text following the closing parenthesis on the same line is kept as the
 * first text line.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::errors::CaptionError;
use crate::subtitle_processor::RawCaption;

/// How speakers are read from raw captions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeakerMode {
    /// The whole first line is the grouping key and speaker label
    FirstLine,
    /// Parse a `(NAME)` marker, fall back to first-line grouping without a speaker
    #[default]
    Marker,
    /// Parse a `(NAME)` marker and reject captions without one
    Required,
}

impl fmt::Display for SpeakerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FirstLine => "first-line",
            Self::Marker => "marker",
            Self::Required => "required",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SpeakerMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "first-line" | "firstline" | "line" => Ok(Self::FirstLine),
            "marker" => Ok(Self::Marker),
            "required" => Ok(Self::Required),
            _ => Err(anyhow!("Invalid speaker mode: {}", s)),
        }
    }
}

/// Key used to decide whether adjacent captions belong to the same utterance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Speaker name parsed from a marker
    Speaker(String),
    /// Verbatim first line
    Line(String),
}

/// Result of reading one caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// Grouping key
    pub key: GroupKey,
    /// Speaker label, empty when unknown
    pub speaker: String,
    /// Text lines left after removing the speaker
    pub text_lines: Vec<String>,
}

/// Parse a leading `(NAME)` marker.
///
/// Returns the trimmed name and whatever follows the marker on the line.
pub fn parse_marker(line: &str) -> Option<(&str, &str)> {
    let inner = line.strip_prefix('(')?;
    let close = inner.find(')')?;
    let name = inner[..close].trim();

    if name.is_empty() || name.contains('(') {
        return None;
    }

    Some((name, inner[close + 1..].trim()))
}

/// Strip parentheses from a first line to get a display label
fn label_from_line(line: &str) -> String {
    line.replace(['(', ')'], "").trim().to_string()
}

/// Attribute a caption to a speaker under the given mode.
///
/// `position` is the caption's 1-based position, used for error reporting.
pub fn extract_speaker(caption: &RawCaption, mode: SpeakerMode, position: usize) -> Result<Attribution, CaptionError> {
    let first = caption.first_line();
    let rest = || caption.lines.iter().skip(1).cloned().collect::<Vec<_>>();

    if mode == SpeakerMode::FirstLine {
        return Ok(Attribution {
            key: GroupKey::Line(first.to_string()),
            speaker: label_from_line(first),
            text_lines: rest(),
        });
    }

    match parse_marker(first) {
        Some((name, remainder)) => {
            let mut text_lines = Vec::with_capacity(caption.lines.len());
            if !remainder.is_empty() {
                text_lines.push(remainder.to_string());
            }
            text_lines.extend(rest());

            Ok(Attribution {
                key: GroupKey::Speaker(name.to_string()),
                speaker: name.to_string(),
                text_lines,
            })
        }
        None if mode == SpeakerMode::Required => Err(CaptionError::MalformedCaption {
            index: position,
            line: first.to_string(),
        }),
        None => Ok(Attribution {
            key: GroupKey::Line(first.to_string()),
            speaker: String::new(),
            text_lines: rest(),
        }),
    }
}

/// Build the default translation prompt from the distinct speaker labels, in order of appearance
pub fn speaker_context<'a, I>(speakers: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<&str> = Vec::new();
    for speaker in speakers {
        if !speaker.is_empty() && !seen.contains(&speaker) {
            seen.push(speaker);
        }
    }

    if seen.is_empty() {
        String::new()
    } else {
        format!("Speakers include: {}", seen.join(", "))
    }
}
