use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::advice::types::Language;

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// Text-to-text translation through the public Google Translate endpoint.
/// Failures are logged and the input comes back unchanged.
pub struct Translator {
    client: reqwest::Client,
    base_url: String,
}

impl Translator {
    pub fn from_env() -> Result<Self> {
        let base_url =
            dotenv::var("TRANSLATE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub async fn translate(&self, text: &str, target: Language) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        match self.request(text, target).await {
            Ok(translated) if !translated.is_empty() => translated,
            Ok(_) => text.to_string(),
            Err(e) => {
                warn!(lang = target.name(), error = %e, "translation failed, keeping original");
                text.to_string()
            }
        }
    }

    pub async fn translate_list(&self, items: &[String], target: Language) -> Vec<String> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.translate(item, target).await);
        }
        out
    }

    async fn request(&self, text: &str, target: Language) -> Result<String> {
        let url = format!(
            "{}/translate_a/single",
            self.base_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target.code()),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await
            .context("translation request failed")?
            .error_for_status()
            .context("translation service returned an error")?;

        let body: Value = resp.json().await.context("translation response is not JSON")?;
        let translated = join_segments(&body)
            .ok_or_else(|| anyhow::anyhow!("unexpected translation response shape"))?;
        debug!(lang = target.name(), len = translated.len(), "translated");
        Ok(translated)
    }
}

/// The response is `[[["translated", "source", ...], ...], ...]`; one inner
/// entry per sentence.
fn join_segments(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    Some(
        segments
            .iter()
            .filter_map(|seg| seg.get(0).and_then(Value::as_str))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_join_segments() {
        let body = json!([[["नमस्ते। ", "Hello. ", null], ["दुनिया", "World", null]], null, "en"]);
        assert_eq!(join_segments(&body).as_deref(), Some("नमस्ते। दुनिया"));
        assert_eq!(join_segments(&json!({"x": 1})), None);
    }

    #[tokio::test]
    async fn test_translate_joins_sentences() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate_a/single"))
            .and(query_param("tl", "hi"))
            .and(body_string_contains("q=Hello"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([[["नमस्ते", "Hello", null]], null, "en"])),
            )
            .mount(&server)
            .await;

        let translator = Translator::new(server.uri()).unwrap();
        assert_eq!(translator.translate("Hello", Language::Hindi).await, "नमस्ते");
    }

    #[tokio::test]
    async fn test_failure_returns_original() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let translator = Translator::new(server.uri()).unwrap();
        let items = vec!["Keep receipts".to_string(), "Call 112".to_string()];
        assert_eq!(translator.translate_list(&items, Language::Tamil).await, items);
    }

    #[tokio::test]
    async fn test_empty_text_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let translator = Translator::new(server.uri()).unwrap();
        assert_eq!(translator.translate("", Language::Bengali).await, "");
        assert_eq!(translator.translate("  ", Language::Bengali).await, "  ");
    }
}
