//! Speech-to-text client.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::info;

use vtrim_models::TranscriptSegment;

use crate::error::{AiError, AiResult};

/// Audio -> ordered list of (start, end, text) segments.
///
/// Segments satisfy `start <= end` and are ordered by start
/// non-decreasing; they are not necessarily non-overlapping — the
/// caller normalizes downstream.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> AiResult<Vec<TranscriptSegment>>;
}

/// Client for an OpenAI-compatible `/v1/audio/transcriptions` endpoint
/// with `verbose_json` segment output.
pub struct WhisperApiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    segments: Vec<ResponseSegment>,
}

#[derive(Debug, Deserialize)]
struct ResponseSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> AiResult<Self> {
        let base_url = std::env::var("WHISPER_API_URL")
            .map_err(|_| AiError::config("WHISPER_API_URL not set"))?;
        let api_key = std::env::var("WHISPER_API_KEY")
            .map_err(|_| AiError::config("WHISPER_API_KEY not set"))?;
        let model = std::env::var("WHISPER_MODEL").unwrap_or_else(|_| "whisper-1".to_string());
        Ok(Self::new(base_url, api_key, model))
    }
}

#[async_trait]
impl Transcriber for WhisperApiClient {
    async fn transcribe(&self, audio_path: &Path) -> AiResult<Vec<TranscriptSegment>> {
        info!(audio = %audio_path.display(), model = %self.model, "Transcribing audio");

        let bytes = tokio::fs::read(audio_path).await?;
        let filename = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());

        let file_part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("audio/wav")
            .map_err(|e| AiError::malformed(format!("invalid mime: {}", e)))?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }

        let parsed: TranscriptionResponse = response.json().await?;

        let segments = parsed
            .segments
            .into_iter()
            .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
            .collect::<Vec<_>>();

        info!(segments = segments.len(), "Transcription finished");
        Ok(segments)
    }
}
