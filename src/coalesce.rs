/*!
 * Utterance coalescing.
 *
 * Consecutive captions with the same grouping key are folded into one
 * utterance covering their combined span. Keys compare by exact string
 * equality and there is no maximum gap between merged captions.
 */

use crate::errors::CaptionError;
use crate::speaker::{extract_speaker, GroupKey, SpeakerMode};
use crate::subtitle_processor::RawCaption;

/// A coalesced, speaker-attributed span of source audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// 1-based position among the recording's utterances
    pub index: usize,

    /// Speaker label, empty when unknown
    pub speaker: String,

    /// Grouping key shared by all merged captions
    pub key: GroupKey,

    /// Start of the first merged caption, in ms
    pub start_ms: u64,

    /// End of the last merged caption, in ms
    pub end_ms: u64,

    /// Merged caption text, whitespace-joined
    pub source_text: String,
}

impl Utterance {
    /// Span length in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Render the utterance back as a single raw caption with the same key
    pub fn to_raw_caption(&self) -> RawCaption {
        let first_line = match &self.key {
            GroupKey::Speaker(name) => format!("({})", name),
            GroupKey::Line(line) => line.clone(),
        };

        let mut lines = vec![first_line];
        if !self.source_text.is_empty() {
            lines.push(self.source_text.clone());
        }

        RawCaption {
            start_ms: self.start_ms,
            end_ms: self.end_ms,
            lines,
        }
    }
}

/// Utterance under construction
struct Pending {
    key: GroupKey,
    speaker: String,
    start_ms: u64,
    end_ms: u64,
    text: Vec<String>,
}

impl Pending {
    fn close(self, index: usize) -> Utterance {
        Utterance {
            index,
            speaker: self.speaker,
            key: self.key,
            start_ms: self.start_ms,
            end_ms: self.end_ms,
            source_text: self.text.join(" "),
        }
    }
}

fn text_words(lines: Vec<String>) -> impl Iterator<Item = String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

/// Fold the ordered caption sequence into utterances.
///
/// Output order is input order and indices are dense starting at 1.
pub fn coalesce(captions: &[RawCaption], mode: SpeakerMode) -> Result<Vec<Utterance>, CaptionError> {
    let (mut utterances, pending) = captions.iter().enumerate().try_fold(
        (Vec::new(), None::<Pending>),
        |(mut done, pending), (position, caption)| {
            let attribution = extract_speaker(caption, mode, position + 1)?;

            let next = match pending {
                Some(mut current) if current.key == attribution.key => {
                    current.end_ms = caption.end_ms;
                    current.text.extend(text_words(attribution.text_lines));
                    current
                }
                previous => {
                    if let Some(finished) = previous {
                        let index = done.len() + 1;
                        done.push(finished.close(index));
                    }
                    Pending {
                        key: attribution.key,
                        speaker: attribution.speaker,
                        start_ms: caption.start_ms,
                        end_ms: caption.end_ms,
                        text: text_words(attribution.text_lines).collect(),
                    }
                }
            };

            Ok::<_, CaptionError>((done, Some(next)))
        },
    )?;

    if let Some(last) = pending {
        let index = utterances.len() + 1;
        utterances.push(last.close(index));
    }

    Ok(utterances)
}
