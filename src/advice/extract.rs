use serde_json::{Map, Value};

use super::types::{text_of, AdviceOutcome, AdviceRecord};

/// Recover a JSON object from model output.
///
/// Tries, in order: the whole trimmed text; the span from the first `{` to
/// the last `}`; that same span with newlines flattened to spaces and single
/// quotes swapped for double quotes. The last step is lossy: apostrophes in
/// values get mangled.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(obj) = parse_object(s) {
        return Some(obj);
    }

    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end < start {
        return None;
    }
    let candidate = &s[start..=end];
    if let Some(obj) = parse_object(candidate) {
        return Some(obj);
    }

    let repaired = candidate.replace('\n', " ").replace('\'', "\"");
    parse_object(&repaired)
}

fn parse_object(s: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Decide what a raw model response means for the user.
pub fn classify(raw: &str) -> AdviceOutcome {
    match extract_json_object(raw) {
        // An empty object carries nothing to show.
        None => AdviceOutcome::Unparseable,
        Some(obj) if obj.is_empty() => AdviceOutcome::Unparseable,
        Some(obj) => match obj.get("error") {
            Some(err) => AdviceOutcome::ModelError(text_of(err).unwrap_or_else(|| err.to_string())),
            None => AdviceOutcome::Advice(AdviceRecord::from_object(&obj)),
        },
    }
}
