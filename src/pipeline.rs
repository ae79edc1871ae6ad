/*!
 * Per-utterance translation pipeline.
 *
 * Utterances are processed strictly in order with one translation call in
 * flight at a time. For each utterance the pipeline clips its audio, calls
 * the provider under a duration-derived budget, resegments the returned
 * text and hands the captions to the sink before moving on, so a failure
 * at utterance N leaves captions 1..N-1 persisted.
 */

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::app_config::Config;
use crate::coalesce::Utterance;
use crate::errors::{AppError, CaptionError, TranslationError};
use crate::media::AudioClipper;
use crate::providers::{AudioTranslationRequest, Provider};
use crate::resegment::resegment;
use crate::subtitle_processor::{format_clock, CaptionSink};
use crate::timing::TimeoutPolicy;

/// Tunables for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Per-call time budget
    pub timeout: TimeoutPolicy,

    /// Target maximum characters per output caption
    pub max_caption_length: usize,

    /// Extra attempts after the first failure
    pub retry_count: u32,

    /// Base backoff between attempts, doubled after each retry
    pub retry_backoff_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PipelineSettings {
    /// Build settings from the application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.translation.timeout_policy(),
            max_caption_length: config.captions.max_caption_length,
            retry_count: config.translation.retry_count,
            retry_backoff_ms: config.translation.retry_backoff_ms,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Utterances translated
    pub utterances: usize,

    /// Captions handed to the sink
    pub captions_written: usize,

    /// Translation calls made, including retries
    pub attempts: u32,

    /// Wall time spent in the run
    pub elapsed: Duration,
}

/// Sequential clip → translate → resegment → write loop
pub struct Pipeline<C: AudioClipper, P: Provider> {
    clipper: C,
    provider: P,
    settings: PipelineSettings,
}

impl<C: AudioClipper, P: Provider> Pipeline<C, P> {
    pub fn new(clipper: C, provider: P, settings: PipelineSettings) -> Self {
        Self { clipper, provider, settings }
    }

    /// Provider in use
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Translate one utterance, retrying up to `retry_count` times.
    ///
    /// Returns the text and the number of attempts it took.
    pub async fn translate_utterance(&self, utterance: &Utterance, context: &str) -> Result<(String, u32), AppError> {
        if utterance.end_ms <= utterance.start_ms {
            return Err(CaptionError::InvalidTimeRange {
                start_ms: utterance.start_ms,
                end_ms: utterance.end_ms,
            }.into());
        }

        let audio = self.clipper.clip(utterance.start_ms, utterance.end_ms).await?;
        let budget = self.settings.timeout.budget(utterance.duration_ms());
        let max_attempts = self.settings.retry_count.saturating_add(1);

        debug!(
            "Translating audio {} -> {} (timeout {:.1}s, {} bytes)",
            format_clock(utterance.start_ms),
            format_clock(utterance.end_ms),
            budget.as_secs_f64(),
            audio.len()
        );

        let mut attempt = 0;
        loop {
            attempt += 1;

            let request = AudioTranslationRequest {
                audio: audio.clone(),
                file_name: self.clipper.file_name(),
                prompt: context.to_string(),
                timeout: budget,
            };

            let failure = match tokio::time::timeout(budget, self.provider.translate_audio(request)).await {
                Ok(Ok(text)) => return Ok((text, attempt)),
                Ok(Err(source)) => TranslationError::Service {
                    utterance: utterance.index,
                    attempts: attempt,
                    source,
                },
                Err(_) => TranslationError::Timeout {
                    utterance: utterance.index,
                    budget,
                    attempts: attempt,
                },
            };

            if attempt >= max_attempts {
                return Err(failure.into());
            }

            let delay = self.settings.backoff(attempt);
            warn!("{} - retrying in {}ms", failure, delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }

    /// Run every utterance through the pipeline, writing to `sink` as it goes.
    ///
    /// `on_progress` is called after each utterance with the number completed,
    /// the total, and the utterance just written.
    pub async fn run<S, F>(
        &self,
        utterances: &[Utterance],
        context: &str,
        sink: &mut S,
        mut on_progress: F,
    ) -> Result<PipelineReport, AppError>
    where
        S: CaptionSink,
        F: FnMut(usize, usize, &Utterance),
    {
        let start_time = Instant::now();
        let total = utterances.len();
        let mut written = 0;
        let mut attempts = 0;

        info!("Translating {} utterances with {}", total, self.provider.display_name());

        for (position, utterance) in utterances.iter().enumerate() {
            let (text, used) = self.translate_utterance(utterance, context).await?;
            attempts += used;

            let captions = resegment(utterance, &text, self.settings.max_caption_length, written + 1)?;

            sink.write_captions(&captions)
                .map_err(|e| AppError::File(format!("Failed to write captions: {:#}", e)))?;
            written += captions.len();

            debug!(
                "Utterance {} ({}) -> {} caption(s)",
                utterance.index,
                if utterance.speaker.is_empty() { "unknown" } else { &utterance.speaker },
                captions.len()
            );

            on_progress(position + 1, total, utterance);
        }

        Ok(PipelineReport {
            utterances: total,
            captions_written: written,
            attempts,
            elapsed: start_time.elapsed(),
        })
    }
}
