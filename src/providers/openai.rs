use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};

use crate::errors::ProviderError;
use crate::providers::{AudioTranslationRequest, Provider};

/// OpenAI client for the Whisper audio translation endpoint
pub struct OpenAIWhisper {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model name
    model: String,
}

impl std::fmt::Debug for OpenAIWhisper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIWhisper")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAIWhisper {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into the matching provider error
    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let message = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("OpenAI API error ({}): {}", status, message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
            _ => ProviderError::ApiError { status_code: status.as_u16(), message },
        }
    }

    fn transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() || e.is_connect() {
            ProviderError::ConnectionError(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl Provider for OpenAIWhisper {
    async fn translate_audio(&self, request: AudioTranslationRequest) -> Result<String, ProviderError> {
        let size = request.audio.len();
        let part = Part::bytes(request.audio.to_vec())
            .file_name(request.file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("prompt", request.prompt)
            .text("response_format", "text");

        debug!("Uploading {} bytes to {} (timeout {:?})", size, self.url("audio/translations"), request.timeout);

        let response = self.client.post(self.url("audio/translations"))
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let text = response.text().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(text.trim().to_string())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self.client.get(self.url(&format!("models/{}", self.model)))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    fn display_name(&self) -> String {
        format!("OpenAI - {}", self.model)
    }
}
