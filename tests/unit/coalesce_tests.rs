/*!
 * Tests for folding parsed caption tracks into utterances
 */

use captrans::speaker::{GroupKey, SpeakerMode};
use captrans::subtitle_processor::{parse_srt_string, RawCaption};
use captrans::{coalesce, Utterance};
use crate::common;

#[test]
fn test_coalesce_meetingTrack_shouldProduceTwoUtterances() {
    let captions = parse_srt_string(common::MEETING_SRT, true).unwrap();
    let utterances = coalesce(&captions, SpeakerMode::Marker).unwrap();

    assert_eq!(utterances.len(), 2);
    assert_eq!(utterances[0].speaker, "Ana");
    assert_eq!((utterances[0].start_ms, utterances[0].end_ms), (0, 5_000));
    assert_eq!(utterances[0].source_text, "Hi there");
    assert_eq!(utterances[1].speaker, "Bob");
    assert_eq!((utterances[1].start_ms, utterances[1].end_ms), (5_000, 7_000));
    assert_eq!(utterances[1].source_text, "Hey");
}

#[test]
fn test_coalesce_withUnmarkedLines_shouldGroupByVerbatimLine() {
    let content = "1\n00:00:00,000 --> 00:00:01,000\nGuest\nhello\n\n\
                   2\n00:00:01,000 --> 00:00:02,000\nGuest\nagain\n\n\
                   3\n00:00:02,000 --> 00:00:03,000\n(Guest)\nmarked\n";
    let captions = parse_srt_string(content, true).unwrap();
    let utterances = coalesce(&captions, SpeakerMode::Marker).unwrap();

    // A bare line and a marker with the same text are different keys
    assert_eq!(utterances.len(), 2);
    assert_eq!(utterances[0].key, GroupKey::Line("Guest".to_string()));
    assert_eq!(utterances[0].source_text, "hello again");
    assert!(utterances[0].speaker.is_empty());
    assert_eq!(utterances[1].key, GroupKey::Speaker("Guest".to_string()));
}

#[test]
fn test_coalesce_withOutOfOrderTrack_shouldUseSortedOrder() {
    let content = "2\n00:00:02,000 --> 00:00:03,000\n(Ana)\nsecond\n\n\
                   1\n00:00:00,000 --> 00:00:01,000\n(Ana)\nfirst\n";
    let captions = parse_srt_string(content, true).unwrap();
    let utterances = coalesce(&captions, SpeakerMode::Marker).unwrap();

    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].source_text, "first second");
    assert_eq!((utterances[0].start_ms, utterances[0].end_ms), (0, 3_000));
}

#[test]
fn test_coalesce_twice_shouldBeIdempotentOnMeetingTrack() {
    let captions = parse_srt_string(common::MEETING_SRT, true).unwrap();
    let first = coalesce(&captions, SpeakerMode::Marker).unwrap();

    let replayed: Vec<RawCaption> = first.iter().map(Utterance::to_raw_caption).collect();
    let second = coalesce(&replayed, SpeakerMode::Marker).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_coalesce_longMonologue_shouldStayOneUtterance() {
    let content: String = (0..50u64)
        .map(|i| {
            format!(
                "{}\n00:{:02}:{:02},000 --> 00:{:02}:{:02},500\n(Ana)\nline {}\n\n",
                i + 1, i / 60, i % 60, i / 60, i % 60, i
            )
        })
        .collect();
    let captions = parse_srt_string(&content, true).unwrap();
    let utterances = coalesce(&captions, SpeakerMode::Required).unwrap();

    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].end_ms, 49_500);
    assert_eq!(utterances[0].source_text.split_whitespace().count(), 100);
}
