use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Upstream error bodies are cut to this many characters in the error message.
const ERROR_BODY_CHARS: usize = 300;

/// Every way a call to the generative service can fail before we have text.
#[derive(Debug, Error)]
pub enum ModelCallError {
    #[error("no API key configured")]
    MissingKey,
    #[error("{0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("API key rejected (status {0})")]
    Auth(StatusCode),
    #[error("quota exhausted or rate limited")]
    Quota,
    #[error("prompt blocked: {0}")]
    Blocked(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Malformed(String),
}

impl ModelCallError {
    /// Stable name used as the `<kind>` prefix of the error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingKey => "MissingApiKey",
            Self::Network(_) => "NetworkError",
            Self::Timeout => "Timeout",
            Self::Auth(_) => "AuthError",
            Self::Quota => "QuotaExceeded",
            Self::Blocked(_) => "BlockedPrompt",
            Self::Status { .. } => "HttpStatusError",
            Self::Malformed(_) => "MalformedResponse",
        }
    }
}

/// Result of one model invocation, before it is flattened onto the raw channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelCallOutcome {
    Success(String),
    Failure { kind: &'static str, message: String },
}

impl ModelCallOutcome {
    /// Collapse into the single raw string consumers see. Failures become
    /// `{"error": "<kind>: <message>"}`.
    pub fn into_raw(self) -> String {
        match self {
            Self::Success(text) => text,
            Self::Failure { kind, message } => {
                json!({ "error": format!("{}: {}", kind, message) }).to_string()
            }
        }
    }
}

impl From<ModelCallError> for ModelCallOutcome {
    fn from(err: ModelCallError) -> Self {
        Self::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn from_env() -> Result<Self> {
        let api_key = dotenv::var("GEMINI_API_KEY")
            .or_else(|_| dotenv::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty())
            .context(
                "GEMINI_API_KEY not found. Add `GEMINI_API_KEY=YOUR_KEY` to a .env file in the \
                 project root, then restart.",
            )?;
        let base_url =
            dotenv::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = dotenv::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self::new(base_url, model, api_key)
    }

    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key_len(&self) -> usize {
        self.api_key.len()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Send a prompt and return the raw text. Never fails: errors come back
    /// as an `{"error": ...}` JSON string on the same channel.
    pub async fn call(&self, prompt: &str) -> String {
        self.invoke(prompt).await.into_raw()
    }

    pub async fn invoke(&self, prompt: &str) -> ModelCallOutcome {
        match self.generate(prompt).await {
            Ok(text) => ModelCallOutcome::Success(text),
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "model call failed");
                err.into()
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelCallError> {
        if self.api_key.is_empty() {
            return Err(ModelCallError::MissingKey);
        }

        let body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": { "temperature": 0.3 }
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ModelCallError::Timeout
                } else {
                    ModelCallError::Network(err.to_string())
                }
            })?;

        match resp.status() {
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                return Err(ModelCallError::Auth(status))
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ModelCallError::Quota),
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(ModelCallError::Status {
                    status: status.as_u16(),
                    body: clip(&body, ERROR_BODY_CHARS),
                });
            }
            _ => {}
        }

        let text = resp
            .text()
            .await
            .map_err(|err| ModelCallError::Network(err.to_string()))?;
        let json: Value = serde_json::from_str(&text)
            .map_err(|err| ModelCallError::Malformed(format!("response is not JSON: {err}")))?;

        if let Some(reason) = blocked_reason(&json) {
            return Err(ModelCallError::Blocked(reason));
        }

        let content = unwrap_envelope(&json);
        debug!(model = %self.model, response_len = content.len(), "model responded");
        Ok(content)
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// A prompt rejected by safety filters comes back as 200 with no candidates.
fn blocked_reason(body: &Value) -> Option<String> {
    let has_candidates = body
        .get("candidates")
        .and_then(Value::as_array)
        .is_some_and(|c| !c.is_empty());
    if has_candidates {
        return None;
    }
    body.pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
        .map(str::to_string)
}

type EnvelopeExtractor = fn(&Value) -> Option<String>;

/// Known response shapes, tried in order.
const ENVELOPE_SHAPES: &[(&str, EnvelopeExtractor)] = &[
    ("plain-text", plain_text),
    ("candidate-list", candidate_list),
    ("generic-object", generic_object),
];

/// Pull the best textual payload out of a response body, falling back to the
/// body's own JSON text.
pub fn unwrap_envelope(body: &Value) -> String {
    for (shape, extract) in ENVELOPE_SHAPES {
        if let Some(text) = extract(body) {
            debug!(shape, "unwrapped model response");
            return text;
        }
    }
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn plain_text(body: &Value) -> Option<String> {
    non_empty_str(body.get("text"))
}

fn candidate_list(body: &Value) -> Option<String> {
    let first = ["candidates", "outputs"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_array))
        .find(|items| !items.is_empty())?
        .first()?;

    // Gemini: candidates[0].content.parts[].text
    if let Some(parts) = first.pointer("/content/parts").and_then(Value::as_array) {
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        if !text.is_empty() {
            return Some(text);
        }
    }

    ["content", "text", "output"]
        .iter()
        .find_map(|key| non_empty_str(first.get(*key)))
}

fn generic_object(body: &Value) -> Option<String> {
    body.get("output").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_unwrap_gemini_candidates() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"case_type\":" }, { "text": "\"consumer\"}" }] }
            }]
        });
        assert_eq!(unwrap_envelope(&body), r#"{"case_type":"consumer"}"#);
    }

    #[test]
    fn test_unwrap_plain_text_wins() {
        let body = json!({ "text": "hello", "output": "ignored" });
        assert_eq!(unwrap_envelope(&body), "hello");
    }

    #[test]
    fn test_unwrap_outputs_when_candidates_empty() {
        let body = json!({ "candidates": [], "outputs": [{ "output": "from outputs" }] });
        assert_eq!(unwrap_envelope(&body), "from outputs");
    }

    #[test]
    fn test_unwrap_generic_output() {
        let body = json!({ "output": "generic" });
        assert_eq!(unwrap_envelope(&body), "generic");
    }

    #[test]
    fn test_unwrap_falls_back_to_stringify() {
        let body = json!({ "unexpected": 1 });
        assert_eq!(unwrap_envelope(&body), r#"{"unexpected":1}"#);
    }

    #[test]
    fn test_failure_payload_shape() {
        let raw = ModelCallOutcome::from(ModelCallError::Quota).into_raw();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed["error"],
            "QuotaExceeded: quota exhausted or rate limited"
        );
    }

    #[tokio::test]
    async fn test_call_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "{\"severity\": 3}" }] } }]
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(server.uri(), "test-model", "secret").unwrap();
        assert_eq!(client.call("prompt").await, r#"{"severity": 3}"#);
    }

    #[tokio::test]
    async fn test_call_rate_limited_becomes_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = LlmClient::new(server.uri(), "test-model", "secret").unwrap();
        let raw = client.call("prompt").await;
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed["error"].as_str().unwrap().starts_with("QuotaExceeded:"));
    }

    #[tokio::test]
    async fn test_call_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = LlmClient::new(server.uri(), "test-model", "bad").unwrap();
        let outcome = client.invoke("prompt").await;
        assert!(matches!(
            outcome,
            ModelCallOutcome::Failure { kind: "AuthError", .. }
        ));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(server.uri(), "test-model", "secret").unwrap();
        let outcome = client.invoke("prompt").await;
        assert_eq!(
            outcome,
            ModelCallOutcome::Failure {
                kind: "BlockedPrompt",
                message: "prompt blocked: SAFETY".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_large_error_body_is_clipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("e".repeat(5000)))
            .mount(&server)
            .await;

        let client = LlmClient::new(server.uri(), "test-model", "secret").unwrap();
        match client.invoke("prompt").await {
            ModelCallOutcome::Failure { kind, message } => {
                assert_eq!(kind, "HttpStatusError");
                assert_eq!(message, format!("status 500: {}...", "e".repeat(300)));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        assert_eq!(clip("short", 300), "short");
        assert_eq!(clip("नमस्ते", 2), "नम...");
    }

    #[tokio::test]
    async fn test_missing_key_never_hits_network() {
        let client = LlmClient::new("http://127.0.0.1:9", "test-model", "").unwrap();
        let raw = client.call("prompt").await;
        assert!(raw.contains("MissingApiKey"));
    }
}
