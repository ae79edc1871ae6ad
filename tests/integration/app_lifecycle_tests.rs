/*!
 * Controller tests that stay clear of ffmpeg and the network
 */

use std::fs;

use captrans::app_config::Config;
use captrans::app_controller::{Controller, RunOptions};
use captrans::file_utils::FileManager;
use captrans::providers::mock::MockProvider;
use captrans::speaker::SpeakerMode;
use captrans::subtitle_processor::parse_srt_file;
use captrans::CaptionError;
use crate::common::{self, RecordingClipper};

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipWithoutForce() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "call.mp4", "not really a video").unwrap();
    let existing = FileManager::subtitle_output_path(&input);
    fs::write(&existing, "keep me").unwrap();

    let controller = Controller::with_config(Config::default()).unwrap();
    let report = controller
        .run(RunOptions { input_file: input, ..Default::default() })
        .await
        .unwrap();

    assert!(report.is_none());
    assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");
}

#[tokio::test]
async fn test_load_then_translate_shouldWriteCaptionFile() {
    let dir = common::create_temp_dir().unwrap();
    let srt = common::create_test_file(dir.path(), "meeting.srt", common::MEETING_SRT).unwrap();
    let output_path = dir.path().join("meeting.mp4.srt");

    let controller = Controller::with_config(Config::default()).unwrap();
    let utterances = controller
        .load_utterances(&dir.path().join("meeting.mp4"), Some(&srt), dir.path())
        .await
        .unwrap();

    let report = controller
        .translate_with(RecordingClipper::new(), MockProvider::fixed("Good morning"), &utterances, "", &output_path)
        .await
        .unwrap();

    assert_eq!(report.captions_written, 2);
    let written = parse_srt_file(&output_path, true).unwrap();
    assert_eq!(written[0].lines, vec!["(Ana)", "Good morning"]);
    assert_eq!(written[1].lines, vec!["(Bob)", "Good morning"]);
}

#[tokio::test]
async fn test_translate_withFailingProvider_shouldKeepFileAndReturnError() {
    let dir = common::create_temp_dir().unwrap();
    let output_path = dir.path().join("out.srt");

    let mut config = Config::default();
    config.translation.retry_count = 0;
    let controller = Controller::with_config(config).unwrap();

    let utterances = vec![common::utterance(1, "Ana", 0, 1_000)];
    let result = controller
        .translate_with(RecordingClipper::new(), MockProvider::failing(), &utterances, "", &output_path)
        .await;

    assert!(result.is_err());
    assert!(!output_path.exists());
    let partial = FileManager::partial_output_path(&output_path);
    assert_eq!(fs::read_to_string(&partial).unwrap(), "");
}

#[tokio::test]
async fn test_translate_withLateFailure_shouldKeepFinishedUtterancesOnlyInPartialFile() {
    let dir = common::create_temp_dir().unwrap();
    let output_path = dir.path().join("standup.mp4.srt");

    let mut config = Config::default();
    config.translation.retry_count = 0;
    let controller = Controller::with_config(config).unwrap();

    let utterances = vec![
        common::utterance(1, "Ana", 0, 1_000),
        common::utterance(2, "Bob", 1_000, 2_000),
    ];
    let result = controller
        .translate_with(RecordingClipper::new(), MockProvider::intermittent(2), &utterances, "", &output_path)
        .await;

    assert!(result.is_err());
    assert!(!output_path.exists());
    let partial = parse_srt_file(&FileManager::partial_output_path(&output_path), true).unwrap();
    assert_eq!(partial.len(), 1);
    assert_eq!(partial[0].lines[0], "(Ana)");
}

#[tokio::test]
async fn test_run_afterFailedRun_shouldNotTreatPartialFileAsFinished() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "call.mp4", "not really a video").unwrap();
    let partial = FileManager::partial_output_path(FileManager::subtitle_output_path(&input));
    fs::write(&partial, "1\n00:00:00,000 --> 00:00:01,000\n(Ana)\nhalf done\n\n").unwrap();
    let not_srt = common::create_test_file(dir.path(), "notes.txt", "just some notes").unwrap();

    let controller = Controller::with_config(Config::default()).unwrap();
    let result = controller
        .run(RunOptions { input_file: input, captions_file: Some(not_srt), ..Default::default() })
        .await;

    // Reaching caption loading means the run was not skipped
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("Not an SRT caption file"));
}

#[tokio::test]
async fn test_load_utterances_inRequiredMode_shouldRejectUnmarkedCaption() {
    let dir = common::create_temp_dir().unwrap();
    let srt = common::create_test_file(
        dir.path(),
        "bad.srt",
        "1\n00:00:00,000 --> 00:00:01,000\n(Ana)\nhi\n\n2\n00:00:01,000 --> 00:00:02,000\nno marker here\n",
    ).unwrap();

    let mut config = Config::default();
    config.captions.speaker_mode = SpeakerMode::Required;
    let controller = Controller::with_config(config).unwrap();

    let err = controller
        .load_utterances(&dir.path().join("bad.mp4"), Some(&srt), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CaptionError>(),
        Some(CaptionError::MalformedCaption { index: 2, .. })
    ));
}

#[tokio::test]
async fn test_load_utterances_withNonSubtitleFile_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let not_srt = common::create_test_file(dir.path(), "notes.txt", "just some notes").unwrap();

    let controller = Controller::with_config(Config::default()).unwrap();
    let result = controller.load_utterances(&dir.path().join("x.mp4"), Some(&not_srt), dir.path()).await;
    assert!(result.is_err());
}
