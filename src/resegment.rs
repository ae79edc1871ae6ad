/*!
 * Caption resegmentation.
 *
 * The translation service returns one untimed string per utterance. This
 * module cuts that string back into display-sized captions and spreads
 * the utterance's span evenly across them:
 *
 * - text no longer than the limit becomes a single caption, untouched;
 * - longer text is split on whitespace into `ceil(len / limit)` chunks of
 *   roughly `ceil(len / chunks)` characters, never splitting a word;
 * - chunk `i` of `n` covers `[start + span*i/n, start + span*(i+1)/n)`, so
 *   the outer bounds are the utterance's own and inner bounds are shared.
 */

use std::ops::Range;

use log::debug;

use crate::coalesce::Utterance;
use crate::errors::ResegmentError;
use crate::subtitle_processor::OutputCaption;

/// Default maximum caption length in characters
pub const DEFAULT_MAX_CAPTION_LENGTH: usize = 900;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Number of chunks and target chunk size for a text of `text_len` characters
pub fn chunk_plan(text_len: usize, max_len: usize) -> (usize, usize) {
    let max_len = max_len.max(1);
    let num_chunks = text_len.div_ceil(max_len).max(1);
    let chunk_size = text_len.div_ceil(num_chunks);
    (num_chunks, chunk_size)
}

/// Greedily pack words into at most `max_chunks` chunks.
///
/// Returns the word ranges of each chunk. A chunk always takes its first
/// word, then keeps adding words while the joined length stays within
/// `chunk_size`. The last permitted chunk takes every remaining word, so
/// the ranges always cover the whole input. Fewer chunks are returned when
/// the words run out first.
pub fn pack_words(words: &[&str], chunk_size: usize, max_chunks: usize) -> Vec<Range<usize>> {
    let max_chunks = max_chunks.max(1);
    let mut chunks = Vec::with_capacity(max_chunks);
    let mut cursor = 0;

    while cursor < words.len() {
        let begin = cursor;

        if chunks.len() + 1 == max_chunks {
            chunks.push(begin..words.len());
            break;
        }

        let mut len = char_len(words[cursor]);
        cursor += 1;
        while cursor < words.len() && len + 1 + char_len(words[cursor]) <= chunk_size {
            len += 1 + char_len(words[cursor]);
            cursor += 1;
        }

        chunks.push(begin..cursor);
    }

    chunks
}

/// Boundary `i` of `n` equal slices of `[start_ms, end_ms]`
fn boundary(start_ms: u64, end_ms: u64, i: usize, n: usize) -> u64 {
    let span = u128::from(end_ms - start_ms);
    start_ms + (span * i as u128 / n as u128) as u64
}

/// Split one utterance's translated text into timed captions.
///
/// `first_index` is the global index given to the first caption; the rest
/// follow consecutively.
pub fn resegment(
    utterance: &Utterance,
    translated: &str,
    max_len: usize,
    first_index: usize,
) -> Result<Vec<OutputCaption>, ResegmentError> {
    let make = |i: usize, n: usize, text: String| OutputCaption {
        index: first_index + i,
        start_ms: boundary(utterance.start_ms, utterance.end_ms, i, n),
        end_ms: boundary(utterance.start_ms, utterance.end_ms, i + 1, n),
        speaker: utterance.speaker.clone(),
        text,
    };

    let text_len = char_len(translated);
    if text_len <= max_len {
        return Ok(vec![make(0, 1, translated.to_string())]);
    }

    let (num_chunks, chunk_size) = chunk_plan(text_len, max_len);
    let words: Vec<&str> = translated.split_whitespace().collect();
    let ranges = pack_words(&words, chunk_size, num_chunks);

    if ranges.is_empty() {
        // Whitespace only
        return Ok(vec![make(0, 1, String::new())]);
    }

    debug!(
        "Utterance {}: {} chars split into {} captions (target {} chars)",
        utterance.index, text_len, ranges.len(), chunk_size
    );

    let n = ranges.len();
    let captions: Vec<OutputCaption> = ranges
        .into_iter()
        .enumerate()
        .map(|(i, range)| make(i, n, words[range].join(" ")))
        .collect();

    verify_segments(utterance, &captions)?;
    Ok(captions)
}

/// Check that captions exactly tile the utterance span with consecutive indices
pub fn verify_segments(utterance: &Utterance, captions: &[OutputCaption]) -> Result<(), ResegmentError> {
    let fail = |reason: String| ResegmentError::Invariant {
        utterance: utterance.index,
        reason,
    };

    let (first, last) = match (captions.first(), captions.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(fail("no captions produced".to_string())),
    };

    if first.start_ms != utterance.start_ms {
        return Err(fail(format!("first caption starts at {} instead of {}", first.start_ms, utterance.start_ms)));
    }
    if last.end_ms != utterance.end_ms {
        return Err(fail(format!("last caption ends at {} instead of {}", last.end_ms, utterance.end_ms)));
    }

    for caption in captions {
        if caption.start_ms > caption.end_ms {
            return Err(fail(format!("caption {} ends before it starts", caption.index)));
        }
    }

    for pair in captions.windows(2) {
        if pair[0].end_ms != pair[1].start_ms {
            return Err(fail(format!(
                "captions {} and {} are not contiguous ({} vs {})",
                pair[0].index, pair[1].index, pair[0].end_ms, pair[1].start_ms
            )));
        }
        if pair[1].index != pair[0].index + 1 {
            return Err(fail(format!("caption index jumps from {} to {}", pair[0].index, pair[1].index)));
        }
    }

    Ok(())
}
