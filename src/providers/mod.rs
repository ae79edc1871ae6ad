/*!
 * Translation service clients.
 *
 * The pipeline only needs one capability from a service: turn a clip of
 * speech into translated text, within a time budget. Implementations:
 * - `openai`: OpenAI Whisper audio translation endpoint
 * - `mock`: scripted provider for tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

/// One audio translation call
#[derive(Debug, Clone)]
pub struct AudioTranslationRequest {
    /// Encoded audio clip
    pub audio: Bytes,

    /// File name sent with the upload; the extension tells the service the codec
    pub file_name: String,

    /// Free-text context, e.g. speaker names or acronyms
    pub prompt: String,

    /// Budget for this call
    pub timeout: Duration,
}

/// Common trait for all translation services
///
/// Implementations must return plain text with no timing information.
/// The caller enforces the budget as a hard cutoff; implementations should
/// also pass it to their transport so abandoned calls release resources.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate the speech in `request.audio`
    async fn translate_audio(&self, request: AudioTranslationRequest) -> Result<String, ProviderError>;

    /// Check that the service is reachable and the credentials are accepted
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Human readable name for logs
    fn display_name(&self) -> String;
}

pub mod mock;
pub mod openai;
