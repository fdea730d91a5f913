pub mod extract;
pub mod present;
pub mod prompts;
pub mod types;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::llm::LlmClient;
use crate::translate::Translator;

use types::{AdviceOutcome, AdviceRecord, AdviceRequest, Analysis, Language};

/// Runs one analysis end to end: translate in, prompt, call, parse,
/// translate out. Every step is awaited in that order.
pub struct AdviceEngine {
    llm: Arc<LlmClient>,
    translator: Arc<Translator>,
}

impl AdviceEngine {
    pub fn new(llm: Arc<LlmClient>, translator: Arc<Translator>) -> Self {
        Self { llm, translator }
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    pub async fn analyze(&self, request: &AdviceRequest) -> Analysis {
        let lang = request.ui_language;

        // The model works in English.
        let input = if lang.is_english() {
            request.raw_text.clone()
        } else {
            self.translator
                .translate(&request.raw_text, Language::English)
                .await
        };

        let prompt = prompts::build_prompt(
            &input,
            lang,
            request.anonymous,
            request.location_hint.as_deref(),
        );
        debug!(prompt_len = prompt.len(), lang = lang.name(), "prompt built");

        let raw = self.llm.call(&prompt).await;
        let outcome = match extract::classify(&raw) {
            AdviceOutcome::Advice(record) if !lang.is_english() => {
                AdviceOutcome::Advice(self.localize(record, lang).await)
            }
            other => other,
        };

        match &outcome {
            AdviceOutcome::Advice(record) => info!(
                case_type = record.case_type.as_deref().unwrap_or("unknown"),
                severity = record.severity.unwrap_or(0),
                laws = record.relevant_laws.len(),
                drafts = record.drafts.len(),
                "analysis complete"
            ),
            AdviceOutcome::ModelError(message) => warn!(%message, "model reported an error"),
            AdviceOutcome::Unparseable => warn!(raw_len = raw.len(), "model output not parseable"),
        }

        Analysis {
            outcome,
            raw,
            language: lang,
            created_at: Utc::now(),
        }
    }

    /// Translate the user-facing parts of a record. Only the summary that will
    /// actually be shown is translated: the markdown if present, otherwise the
    /// short summary.
    async fn localize(&self, mut record: AdviceRecord, lang: Language) -> AdviceRecord {
        let t = &self.translator;

        if let Some(md) = record.presentation_markdown.take() {
            record.presentation_markdown = Some(t.translate(&md, lang).await);
        } else if let Some(summary) = record.short_summary.take() {
            record.short_summary = Some(t.translate(&summary, lang).await);
        }

        for law in &mut record.relevant_laws {
            law.brief = t.translate(&law.brief, lang).await;
        }
        record.action_plan = t.translate_list(&record.action_plan, lang).await;
        for (_, body) in &mut record.drafts {
            *body = t.translate(body, lang).await;
        }
        record.evidence_checklist = t.translate_list(&record.evidence_checklist, lang).await;

        record
    }
}
