/*!
 * Tests for speaker attribution on parsed caption tracks
 */

use captrans::speaker::{extract_speaker, speaker_context, GroupKey, SpeakerMode};
use captrans::subtitle_processor::parse_srt_string;
use captrans::CaptionError;
use crate::common;

#[test]
fn test_extract_onParsedTrack_shouldAttributeEveryCaption() {
    let captions = parse_srt_string(common::MEETING_SRT, true).unwrap();

    let speakers: Vec<String> = captions
        .iter()
        .enumerate()
        .map(|(i, c)| extract_speaker(c, SpeakerMode::Required, i + 1).unwrap().speaker)
        .collect();

    assert_eq!(speakers, vec!["Ana", "Ana", "Bob"]);
}

#[test]
fn test_extract_withStyledMarker_shouldMatchAfterCleanup() {
    let content = "1\n00:00:00,000 --> 00:00:01,000\n<b>(Ana)</b> hola\n";
    let captions = parse_srt_string(content, true).unwrap();

    let attribution = extract_speaker(&captions[0], SpeakerMode::Marker, 1).unwrap();
    assert_eq!(attribution.key, GroupKey::Speaker("Ana".to_string()));
    assert_eq!(attribution.text_lines, vec!["hola"]);
}

#[test]
fn test_extract_withNestedParentheses_shouldBeRejectedInRequiredMode() {
    let content = "1\n00:00:00,000 --> 00:00:01,000\n(Ana (host))\nhi\n";
    let captions = parse_srt_string(content, true).unwrap();

    assert!(matches!(
        extract_speaker(&captions[0], SpeakerMode::Required, 1),
        Err(CaptionError::MalformedCaption { index: 1, .. })
    ));

    let fallback = extract_speaker(&captions[0], SpeakerMode::Marker, 1).unwrap();
    assert_eq!(fallback.key, GroupKey::Line("(Ana (host))".to_string()));
}

#[test]
fn test_speaker_context_fromTrack_shouldListSpeakersOnce() {
    let captions = parse_srt_string(common::MEETING_SRT, true).unwrap();
    let attributions: Vec<_> = captions
        .iter()
        .enumerate()
        .map(|(i, c)| extract_speaker(c, SpeakerMode::Marker, i + 1).unwrap())
        .collect();

    let context = speaker_context(attributions.iter().map(|a| a.speaker.as_str()));
    assert_eq!(context, "Speakers include: Ana, Bob");
}

#[test]
fn test_speaker_mode_display_shouldRoundTripThroughParse() {
    for mode in [SpeakerMode::FirstLine, SpeakerMode::Marker, SpeakerMode::Required] {
        assert_eq!(mode.to_string().parse::<SpeakerMode>().unwrap(), mode);
    }
}
