use std::fmt::Write;

use super::types::{AdviceOutcome, AdviceRecord, Analysis};

/// Raw output shown for diagnostics is capped so it fits in a couple of messages.
const RAW_PREVIEW_CHARS: usize = 1500;

/// Render an analysis as Discord markdown.
pub fn render(analysis: &Analysis) -> String {
    match &analysis.outcome {
        AdviceOutcome::Advice(record) => render_record(record),
        AdviceOutcome::ModelError(message) => format!(
            "**Gemini API error:** {}\n{}",
            message,
            raw_block(&analysis.raw)
        ),
        AdviceOutcome::Unparseable => format!(
            "Model did not return valid JSON. See raw output below.\n{}",
            raw_block(&analysis.raw)
        ),
    }
}

pub fn render_record(record: &AdviceRecord) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "**Case Type:** {} | **Severity (1-10):** {}\n",
        record.case_type.as_deref().unwrap_or("Unknown"),
        record.severity.unwrap_or(0)
    );

    match &record.presentation_markdown {
        Some(md) => {
            out.push_str(md.trim_end());
            out.push('\n');
        }
        None => {
            out.push_str("## Legal Advice (summary)\n");
            out.push_str(record.short_summary.as_deref().unwrap_or(""));
            out.push('\n');
        }
    }

    out.push_str("\n### Relevant Laws\n");
    if record.relevant_laws.is_empty() {
        out.push_str("No relevant laws returned.\n");
    }
    for law in &record.relevant_laws {
        let _ = writeln!(out, "- **{}** — {}", law.section, law.brief);
    }

    out.push_str("\n### Step-by-step Action Plan\n");
    if record.action_plan.is_empty() {
        out.push_str("No action plan returned.\n");
    }
    for (i, step) in record.action_plan.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, step);
    }

    if !record.documents_needed.is_empty() {
        out.push_str("\n### Documents Needed\n");
        for doc in &record.documents_needed {
            let _ = writeln!(out, "- {}", doc);
        }
    }

    out.push_str("\n### Evidence Checklist\n");
    if record.evidence_checklist.is_empty() {
        out.push_str("No evidence suggestions.\n");
    }
    for item in &record.evidence_checklist {
        let _ = writeln!(out, "- [ ] {}", item);
    }

    if !record.drafts.is_empty() {
        out.push_str("\n### Drafts\n");
        for name in record.draft_names() {
            let _ = writeln!(out, "- `{}` (download with `/nyay draft {}`)", name, name);
        }
    }

    out
}

/// File name for the full raw output when the inline preview is cut short.
pub const RAW_ATTACHMENT_NAME: &str = "raw_output.txt";

/// The untouched raw model text, when the rendered reply only carries a
/// preview of it.
pub fn raw_attachment(analysis: &Analysis) -> Option<Vec<u8>> {
    if matches!(analysis.outcome, AdviceOutcome::Advice(_)) {
        return None;
    }
    if analysis.raw.chars().count() <= RAW_PREVIEW_CHARS {
        return None;
    }
    Some(analysis.raw.as_bytes().to_vec())
}

fn raw_block(raw: &str) -> String {
    let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
    // The fence must outrun any backticks the model emitted itself.
    let fence = "`".repeat(longest_backtick_run(&preview).max(2) + 1);
    let mut out = format!("{fence}\n{preview}\n{fence}");
    if preview.len() < raw.len() {
        let _ = write!(
            out,
            "\nPreview only, full output attached as `{}`.",
            RAW_ATTACHMENT_NAME
        );
    }
    out
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}
