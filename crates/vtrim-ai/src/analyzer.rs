//! Keep-range analysis via an OpenAI-compatible chat model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use vtrim_models::{KeepRange, TranscriptSegment};

use crate::error::{AiError, AiResult};

/// Transcript segments -> list of time ranges to keep.
///
/// Any failure here (transport, service error, malformed payload) is
/// reported honestly; the caller owns the full-keep fallback policy.
#[async_trait]
pub trait SegmentAnalyzer: Send + Sync {
    async fn analyze(&self, segments: &[TranscriptSegment]) -> AiResult<Vec<KeepRange>>;
}

const SYSTEM_PROMPT: &str = "\
You are a professional video editor. Given the subtitle list of a video \
with timestamps, remove meaningless filler, rambling repetition, slips of \
the tongue and long stretches of silence.

Input: a JSON list of subtitle segments.
Output: strict JSON with a \"keep_ranges\" list of the time ranges (in \
seconds) that should be KEPT.

Rules:
1. Keep the core information; cut filler words such as \"uh\", \"um\", \"you know\".
2. When the speaker corrects themselves, keep only the corrected version.
3. Merge adjacent kept ranges to avoid overly fragmented cuts.
4. The output must have the form: {\"keep_ranges\": [[0, 5.2], [8.4, 15.0]]}";

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct LlmAnalyzer {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct KeepRangesPayload {
    keep_ranges: Option<Vec<KeepRange>>,
}

/// Compact segment form sent to the model, rounded to limit tokens.
#[derive(Debug, Serialize)]
struct PromptSegment<'a> {
    start: f64,
    end: f64,
    text: &'a str,
}

impl LlmAnalyzer {
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
        let base_url =
            std::env::var("LLM_API_URL").map_err(|_| AiError::config("LLM_API_URL not set"))?;
        let api_key =
            std::env::var("LLM_API_KEY").map_err(|_| AiError::config("LLM_API_KEY not set"))?;
        let model = std::env::var("LLM_MODEL_NAME")
            .unwrap_or_else(|_| "deepseek-ai/DeepSeek-V2.5".to_string());
        Ok(Self::new(base_url, api_key, model))
    }
}

#[async_trait]
impl SegmentAnalyzer for LlmAnalyzer {
    async fn analyze(&self, segments: &[TranscriptSegment]) -> AiResult<Vec<KeepRange>> {
        info!(segments = segments.len(), model = %self.model, "Requesting keep-range analysis");

        let prompt_segments: Vec<PromptSegment<'_>> = segments
            .iter()
            .map(|s| PromptSegment {
                start: round2(s.start),
                end: round2(s.end),
                text: s.text.trim(),
            })
            .collect();
        let user_content = serde_json::to_string(&prompt_segments)
            .map_err(|e| AiError::malformed(format!("failed to encode segments: {}", e)))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            response_format: ResponseFormat { kind: "json_object" },
            temperature: 0.1,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AiError::malformed("no choices in chat response"))?;

        let payload: KeepRangesPayload = serde_json::from_str(strip_code_fences(content))
            .map_err(|e| AiError::malformed(format!("keep_ranges JSON did not parse: {}", e)))?;

        let ranges = payload
            .keep_ranges
            .ok_or_else(|| AiError::malformed("response is missing keep_ranges"))?;

        info!(ranges = ranges.len(), "Analysis finished");
        Ok(ranges)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Models sometimes wrap the JSON object in a markdown code block even
/// when asked for a bare object.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 2.0, "uh well"),
            TranscriptSegment::new(2.0, 9.0, "actual content"),
        ]
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn test_analyze_parses_keep_ranges() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body(r#"{"keep_ranges": [[2.0, 9.0]]}"#)),
            )
            .mount(&server)
            .await;

        let analyzer = LlmAnalyzer::new(server.uri(), "key", "test-model");
        let ranges = analyzer.analyze(&segments()).await.unwrap();
        assert_eq!(ranges, vec![KeepRange::new(2.0, 9.0)]);
    }

    #[tokio::test]
    async fn test_analyze_handles_fenced_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
                "```json\n{\"keep_ranges\": [[0, 5.2], [8.4, 15.0]]}\n```",
            )))
            .mount(&server)
            .await;

        let analyzer = LlmAnalyzer::new(server.uri(), "key", "test-model");
        let ranges = analyzer.analyze(&segments()).await.unwrap();
        assert_eq!(
            ranges,
            vec![KeepRange::new(0.0, 5.2), KeepRange::new(8.4, 15.0)]
        );
    }

    #[tokio::test]
    async fn test_analyze_missing_keep_ranges_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_body(r#"{"ranges": [[0, 1]]}"#)),
            )
            .mount(&server)
            .await;

        let analyzer = LlmAnalyzer::new(server.uri(), "key", "test-model");
        let err = analyzer.analyze(&segments()).await.unwrap_err();
        assert!(matches!(err, AiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_analyze_surfaces_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let analyzer = LlmAnalyzer::new(server.uri(), "key", "test-model");
        let err = analyzer.analyze(&segments()).await.unwrap_err();
        assert!(matches!(err, AiError::Status { status: 429, .. }));
    }
}
