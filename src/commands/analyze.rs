use crate::advice::present;
use crate::advice::types::AdviceRequest;
use crate::commands::send_chunked;
use crate::state::Context;
use poise::serenity_prelude as serenity;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum CaseCategory {
    #[name = "Domestic violence"]
    DomesticViolence,
    Cybercrime,
    Accident,
    Consumer,
    Employment,
    Property,
    Harassment,
    #[name = "Dowry harassment"]
    DowryHarassment,
    Other,
}

impl CaseCategory {
    fn label(self) -> &'static str {
        match self {
            CaseCategory::DomesticViolence => "Domestic violence",
            CaseCategory::Cybercrime => "Cybercrime",
            CaseCategory::Accident => "Accident",
            CaseCategory::Consumer => "Consumer",
            CaseCategory::Employment => "Employment",
            CaseCategory::Property => "Property",
            CaseCategory::Harassment => "Harassment",
            CaseCategory::DowryHarassment => "Dowry harassment",
            CaseCategory::Other => "Other",
        }
    }
}

/// Put the chosen category in front of the description.
fn compose_description(description: &str, category: Option<CaseCategory>) -> String {
    match category {
        Some(c) if description.trim().is_empty() => format!("Category: {}", c.label()),
        Some(c) => format!("Category: {}\n\n{}", c.label(), description.trim()),
        None => description.trim().to_string(),
    }
}

/// Describe your legal issue and get advice, laws, drafts and next steps
#[poise::command(slash_command, guild_only)]
pub async fn analyze(
    ctx: Context<'_>,
    #[description = "Your legal issue in your own words"] description: Option<String>,
    #[description = "Category (optional)"] category: Option<CaseCategory>,
    #[description = "Anonymous mode (don't ask personal info)"] anonymous: Option<bool>,
) -> Result<(), anyhow::Error> {
    let description = description.unwrap_or_default();
    if description.trim().is_empty() && category.is_none() {
        ctx.say("Provide a description or choose a category.").await?;
        return Ok(());
    }

    // The model call can take a while.
    ctx.defer().await?;

    let user_id = ctx.author().id.get();
    let settings = ctx.data().settings_for(user_id).await;
    let request = AdviceRequest {
        raw_text: compose_description(&description, category),
        ui_language: settings.language,
        anonymous: anonymous.unwrap_or(settings.anonymous),
        location_hint: settings.location.clone(),
    };

    info!(
        user = %ctx.author().name,
        lang = request.ui_language.name(),
        anonymous = request.anonymous,
        text_len = request.raw_text.len(),
        "analysis started"
    );

    let analysis = ctx.data().advice.analyze(&request).await;
    let reply = present::render(&analysis);
    let full_raw = present::raw_attachment(&analysis);

    ctx.data().sessions.write().await.insert(user_id, analysis);

    send_chunked(&ctx, &reply).await?;

    if let Some(raw) = full_raw {
        ctx.send(
            poise::CreateReply::default()
                .content("Full raw model output")
                .attachment(serenity::CreateAttachment::bytes(
                    raw,
                    present::RAW_ATTACHMENT_NAME,
                )),
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_description() {
        assert_eq!(compose_description("  lost my phone ", None), "lost my phone");
        assert_eq!(
            compose_description("", Some(CaseCategory::DowryHarassment)),
            "Category: Dowry harassment"
        );
        assert_eq!(
            compose_description("They took my bike", Some(CaseCategory::Accident)),
            "Category: Accident\n\nThey took my bike"
        );
    }
}
