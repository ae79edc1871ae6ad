/*!
 * # captrans - caption-driven speech translation for meeting recordings
 *
 * A Rust library for translating recorded meetings into timed English captions.
 *
 * ## Features
 *
 * - Extract the speaker-labelled caption track of a recording with ffmpeg
 * - Group consecutive captions by speaker into utterances
 * - Translate each utterance's audio with a bounded, duration-derived timeout
 * - Resegment long translations into evenly timed, word-aligned captions
 * - Write captions incrementally so partial output survives failures
 * - Mux the translated track back into a copy of the video
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing, rendering and caption sinks
 * - `speaker`: Speaker attribution and grouping keys
 * - `coalesce`: Folding captions into utterances
 * - `timing`: Translation time budgets
 * - `resegment`: Splitting translated text back into timed captions
 * - `providers`: Translation service clients:
 *   - `providers::openai`: OpenAI Whisper client
 *   - `providers::mock`: Scripted client for tests
 * - `media`: ffmpeg audio clipping and subtitle muxing
 * - `pipeline`: Sequential clip, translate, resegment, write loop
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod coalesce;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod pipeline;
pub mod providers;
pub mod resegment;
pub mod speaker;
pub mod subtitle_processor;
pub mod timing;

// Re-export main types for easier usage
pub use app_config::Config;
pub use coalesce::{coalesce, Utterance};
pub use errors::{AppError, CaptionError, ProviderError, ResegmentError, TranslationError};
pub use pipeline::{Pipeline, PipelineReport, PipelineSettings};
pub use resegment::resegment;
pub use speaker::{extract_speaker, speaker_context, GroupKey, SpeakerMode};
pub use subtitle_processor::{CaptionSink, OutputCaption, RawCaption, SrtSink};
pub use timing::TimeoutPolicy;
