/*!
 * Property sweeps for caption resegmentation
 */

use captrans::resegment::{chunk_plan, resegment, verify_segments, DEFAULT_MAX_CAPTION_LENGTH};
use captrans::subtitle_processor::OutputCaption;
use crate::common;

/// Words of varying length so chunk boundaries land in different places
fn varied_text(words: usize) -> String {
    (0..words)
        .map(|i| "abcdefghijklmnopqrstuvwxyz"[..(i * 7) % 13 + 1].to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalized(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn joined(captions: &[OutputCaption]) -> String {
    captions.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ")
}

#[test]
fn test_resegment_sweep_shouldTileSpanExactly() {
    for words in [1, 2, 17, 80, 333] {
        for max_len in [5, 40, 120, DEFAULT_MAX_CAPTION_LENGTH] {
            for (start, end) in [(0u64, 1u64), (0, 7), (1_234, 9_877), (3_600_000, 3_600_333)] {
                let text = varied_text(words);
                let utterance = common::utterance(4, "Ana", start, end);
                let captions = resegment(&utterance, &text, max_len, 11).unwrap();

                verify_segments(&utterance, &captions).unwrap();
                assert_eq!(captions[0].start_ms, start);
                assert_eq!(captions.last().unwrap().end_ms, end);
                for pair in captions.windows(2) {
                    assert_eq!(pair[0].end_ms, pair[1].start_ms);
                }
            }
        }
    }
}

#[test]
fn test_resegment_sweep_shouldConserveTextAndWords() {
    for words in [1, 9, 64, 250] {
        for max_len in [3, 25, 200] {
            let text = varied_text(words);
            let captions = resegment(&common::utterance(1, "Bob", 0, 60_000), &text, max_len, 1).unwrap();

            assert_eq!(normalized(&joined(&captions)), normalized(&text));

            let source_words: Vec<&str> = text.split_whitespace().collect();
            let output_words: Vec<&str> = captions.iter().flat_map(|c| c.text.split_whitespace()).collect();
            assert_eq!(output_words, source_words);
        }
    }
}

#[test]
fn test_resegment_sweep_shouldRespectChunkPlan() {
    for words in [10, 100, 400] {
        for max_len in [30, 90, 500] {
            let text = varied_text(words);
            let len = text.chars().count();
            let captions = resegment(&common::utterance(1, "", 0, 10_000), &text, max_len, 1).unwrap();

            if len <= max_len {
                assert_eq!(captions.len(), 1);
                assert_eq!(captions[0].text, text);
            } else {
                let (num_chunks, _) = chunk_plan(len, max_len);
                assert!(captions.len() <= num_chunks);
                assert!(captions.len() >= 2);
            }
        }
    }
}

#[test]
fn test_resegment_withOffset_shouldNumberFromOffset() {
    let text = common::numbered_words(300);
    let captions = resegment(&common::utterance(2, "Ana", 0, 30_000), &text, 200, 42).unwrap();

    let indices: Vec<usize> = captions.iter().map(|c| c.index).collect();
    let expected: Vec<usize> = (42..42 + captions.len()).collect();
    assert_eq!(indices, expected);
    assert!(captions.iter().all(|c| c.speaker == "Ana"));
}

#[test]
fn test_resegment_withEvenlySizedWords_shouldBalanceChunks() {
    // 300 five-char words: 1799 characters, two chunks of about 900
    let text = common::numbered_words(300);
    let captions = resegment(&common::utterance(1, "Ana", 0, 10_000), &text, 900, 1).unwrap();

    assert_eq!(captions.len(), 2);
    let sizes: Vec<usize> = captions.iter().map(|c| c.text.chars().count()).collect();
    assert!(sizes.iter().all(|&s| s <= 900), "sizes {:?}", sizes);
    assert!(sizes[0].abs_diff(sizes[1]) <= 12, "sizes {:?}", sizes);
    assert_eq!((captions[0].end_ms, captions[1].start_ms), (5_000, 5_000));
}
