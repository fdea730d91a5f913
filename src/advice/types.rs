use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Languages the bot can converse in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Kannada,
    Marathi,
    Tamil,
    Telugu,
    Bengali,
    Gujarati,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Kannada => "Kannada",
            Language::Marathi => "Marathi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Bengali => "Bengali",
            Language::Gujarati => "Gujarati",
        }
    }

    /// ISO 639-1 code used by the translation service.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Kannada => "kn",
            Language::Marathi => "mr",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Bengali => "bn",
            Language::Gujarati => "gu",
        }
    }

    pub fn is_english(self) -> bool {
        self == Language::English
    }
}

/// One submission from the analyze form.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub raw_text: String,
    pub ui_language: Language,
    pub anonymous: bool,
    pub location_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LawRef {
    pub section: String,
    pub brief: String,
}

/// Structured advice as returned by the model. Every field may be missing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdviceRecord {
    pub case_type: Option<String>,
    pub severity: Option<i64>,
    pub short_summary: Option<String>,
    pub relevant_laws: Vec<LawRef>,
    pub documents_needed: Vec<String>,
    /// Draft name to body, in the order the model emitted them.
    pub drafts: Vec<(String, String)>,
    pub action_plan: Vec<String>,
    pub evidence_checklist: Vec<String>,
    pub presentation_markdown: Option<String>,
}

impl AdviceRecord {
    /// Build a record from a decoded JSON object, ignoring anything that
    /// doesn't have the expected shape.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            case_type: obj.get("case_type").and_then(text_of),
            severity: obj.get("severity").and_then(integer_of),
            short_summary: obj.get("short_summary").and_then(text_of),
            relevant_laws: obj
                .get("relevant_laws")
                .and_then(Value::as_array)
                .map(|laws| laws.iter().filter_map(law_of).collect())
                .unwrap_or_default(),
            documents_needed: text_list(obj.get("documents_needed")),
            drafts: obj
                .get("drafts")
                .and_then(Value::as_object)
                .map(|drafts| {
                    drafts
                        .iter()
                        .map(|(name, body)| (name.clone(), text_of(body).unwrap_or_default()))
                        .collect()
                })
                .unwrap_or_default(),
            action_plan: text_list(obj.get("action_plan")),
            evidence_checklist: text_list(obj.get("evidence_checklist")),
            presentation_markdown: obj.get("presentation_markdown").and_then(text_of),
        }
    }

    pub fn draft(&self, name: &str) -> Option<&str> {
        self.drafts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.as_str())
    }

    pub fn draft_names(&self) -> impl Iterator<Item = &str> {
        self.drafts.iter().map(|(n, _)| n.as_str())
    }
}

/// How an analysis ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AdviceOutcome {
    Advice(AdviceRecord),
    /// The payload carried an `error` key, either from the model or from a
    /// failed call.
    ModelError(String),
    /// No JSON object could be recovered from the raw text.
    Unparseable,
}

/// A finished analysis. The raw model text is always kept for diagnostics.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub outcome: AdviceOutcome,
    pub raw: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

impl Analysis {
    pub fn record(&self) -> Option<&AdviceRecord> {
        match &self.outcome {
            AdviceOutcome::Advice(record) => Some(record),
            _ => None,
        }
    }
}

/// Render a scalar as display text. Null, empty strings and containers yield `None`.
pub(crate) fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(text_of).collect())
        .unwrap_or_default()
}

fn law_of(value: &Value) -> Option<LawRef> {
    match value {
        Value::Object(law) => {
            let section = law
                .get("section")
                .and_then(text_of)
                .or_else(|| law.get("name").and_then(text_of))
                .unwrap_or_default();
            let brief = law.get("brief").and_then(text_of).unwrap_or_default();
            Some(LawRef { section, brief })
        }
        Value::String(s) => Some(LawRef {
            section: s.clone(),
            brief: String::new(),
        }),
        _ => None,
    }
}
