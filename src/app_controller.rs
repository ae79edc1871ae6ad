use anyhow::{Result, Context, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info, debug};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::app_config::Config;
use crate::coalesce::{coalesce, Utterance};
use crate::errors::{CaptionError, ProviderError};
use crate::file_utils::{FileManager, FileType};
use crate::language_utils;
use crate::media::{self, AudioClipper, FfmpegClipper};
use crate::pipeline::{Pipeline, PipelineReport, PipelineSettings};
use crate::providers::openai::OpenAIWhisper;
use crate::providers::Provider;
use crate::speaker::speaker_context;
use crate::subtitle_processor::{self, format_clock, SrtSink};

// @module: Application controller for recording translation

/// What to process in one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Recording to translate
    pub input_file: PathBuf,

    /// External caption file to use instead of the embedded track
    pub captions_file: Option<PathBuf>,

    /// Free-text context; derived from speaker names when empty
    pub context: Option<String>,

    /// Overwrite an existing translated caption file
    pub force_overwrite: bool,
}

/// Main application controller for recording translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate_without_credentials()
            .context("Invalid configuration")?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the whole workflow for one recording.
    ///
    /// Returns `None` when the output already exists and overwriting was not requested.
    pub async fn run(&self, options: RunOptions) -> Result<Option<PipelineReport>> {
        let start_time = Instant::now();
        let input_file = &options.input_file;

        if !input_file.exists() {
            return Err(CaptionError::MissingInput(input_file.clone()).into());
        }

        let output_path = FileManager::subtitle_output_path(input_file);
        if output_path.exists() && !options.force_overwrite {
            warn!("Skipping file, translation already exists at {} (use -f to force overwrite)", output_path.display());
            return Ok(None);
        }

        let scratch = tempfile::Builder::new()
            .prefix("captrans-")
            .tempdir()
            .context("Failed to create scratch directory")?;

        info!("Extracting subtitles");
        let utterances = self.load_utterances(input_file, options.captions_file.as_deref(), scratch.path()).await?;
        let extraction_elapsed = start_time.elapsed();

        let context = match options.context.as_deref().map(str::trim) {
            Some(given) if !given.is_empty() => given.to_string(),
            _ => speaker_context(utterances.iter().map(|u| u.speaker.as_str())),
        };
        info!("Context: {}", context);

        let provider = OpenAIWhisper::new(
            self.config.translation.get_api_key(),
            self.config.translation.endpoint.clone(),
            self.config.translation.model.clone(),
        );
        Self::check_provider(&provider).await?;

        let clipper = FfmpegClipper::new(input_file, self.config.audio.clone())?;

        let report = self.translate_with(clipper, provider, &utterances, &context, &output_path).await?;
        info!("Success: {}", output_path.display());

        if self.config.output.mux_video {
            let video_path = FileManager::translated_video_path(input_file);
            info!("Adding translated subtitles to video at {}", video_path.display());
            let language = language_utils::normalize_to_part2t(&self.config.output.subtitle_language)?;
            if let Ok(name) = language_utils::get_language_name(&language) {
                debug!("Tagging subtitle track as {} ({})", name, language);
            }
            media::mux_subtitles(input_file, &output_path, &video_path, &language).await?;
            info!("Success: {}", video_path.display());
        }

        info!(
            "Done. Extraction: {} - Translation: {} - Total: {}",
            Self::format_duration(extraction_elapsed),
            Self::format_duration(report.elapsed),
            Self::format_duration(start_time.elapsed())
        );

        Ok(Some(report))
    }

    /// Read the source captions, from `captions_file` if given or from the recording itself,
    /// and group them into utterances
    pub async fn load_utterances(&self, input_file: &Path, captions_file: Option<&Path>, scratch_dir: &Path) -> Result<Vec<Utterance>> {
        let strip = self.config.captions.strip_formatting;

        let captions = match captions_file {
            Some(path) => {
                if FileManager::detect_file_type(path)? != FileType::Subtitle {
                    return Err(anyhow!("Not an SRT caption file: {:?}", path));
                }
                subtitle_processor::parse_srt_file(path, strip)?
            }
            None => {
                let srt_path = FileManager::extracted_captions_path(scratch_dir, input_file);
                subtitle_processor::extract_from_media(input_file, &srt_path, strip).await?
            }
        };

        let utterances = coalesce(&captions, self.config.captions.speaker_mode)?;
        info!(
            "Grouped {} captions into {} utterances ({} speaker mode)",
            captions.len(),
            utterances.len(),
            self.config.captions.speaker_mode
        );

        Ok(utterances)
    }

    /// Translate `utterances` into `output_path` using the given collaborators.
    ///
    /// Captions are written incrementally to `{output_path}.partial`, which is
    /// renamed to `output_path` only once every utterance succeeded. On failure
    /// the partial file keeps every utterance finished before the error.
    pub async fn translate_with<C: AudioClipper, P: Provider>(
        &self,
        clipper: C,
        provider: P,
        utterances: &[Utterance],
        context: &str,
        output_path: &Path,
    ) -> Result<PipelineReport> {
        let partial_path = FileManager::partial_output_path(output_path);
        let mut sink = SrtSink::create(&partial_path)?;
        let pipeline = Pipeline::new(clipper, provider, PipelineSettings::from_config(&self.config));

        let progress_bar = ProgressBar::new(utterances.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} utterances ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let result = pipeline.run(utterances, context, &mut sink, move |completed, _total, utterance| {
            pb.set_position(completed as u64);
            pb.set_message(format!("{} -> {}", format_clock(utterance.start_ms), format_clock(utterance.end_ms)));
        }).await;

        match result {
            Ok(report) => {
                progress_bar.finish_and_clear();
                drop(sink);
                fs::rename(&partial_path, output_path)
                    .with_context(|| format!("Failed to move {} to {}", partial_path.display(), output_path.display()))?;
                debug!(
                    "Wrote {} captions for {} utterances in {} attempt(s)",
                    report.captions_written, report.utterances, report.attempts
                );
                Ok(report)
            }
            Err(e) => {
                progress_bar.abandon();
                error!("Translation stopped: {}", e);
                warn!("Partial output kept at {}", sink.path().display());
                Err(e.into())
            }
        }
    }

    /// Fail early on rejected credentials; other connection problems are left to the retry policy
    async fn check_provider<P: Provider>(provider: &P) -> Result<()> {
        match provider.test_connection().await {
            Ok(()) => {
                debug!("Connected to {}", provider.display_name());
                Ok(())
            }
            Err(e @ ProviderError::AuthenticationError(_)) => Err(e.into()),
            Err(e) => {
                warn!("Connection check failed for {}: {}", provider.display_name(), e);
                Ok(())
            }
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
