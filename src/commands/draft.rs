use crate::state::Context;
use poise::serenity_prelude as serenity;

/// Download a draft from your last analysis
#[poise::command(slash_command, guild_only)]
pub async fn draft(
    ctx: Context<'_>,
    #[description = "Draft name, e.g. FIR_email or legal_notice"]
    #[autocomplete = "autocomplete_draft"]
    name: String,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    let found = {
        let sessions = ctx.data().sessions.read().await;
        sessions.get(&user_id).and_then(|analysis| {
            let body = analysis.record()?.draft(&name)?.to_string();
            Some((body, analysis.created_at, analysis.language))
        })
    };

    let Some((body, created_at, language)) = found else {
        ctx.say(format!(
            "No draft named `{}` in your last analysis. Run `/nyay analyze` first.",
            name
        ))
        .await?;
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "**{}** from your analysis of {} UTC ({}). Edit the placeholders before sending.",
                name,
                created_at.format("%Y-%m-%d %H:%M"),
                language.name()
            ))
            .attachment(serenity::CreateAttachment::bytes(
                body.into_bytes(),
                format!("{}.txt", name),
            )),
    )
    .await?;

    Ok(())
}

/// Autocomplete for draft names from the user's last analysis.
async fn autocomplete_draft(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let user_id = ctx.author().id.get();
    let sessions = ctx.data().sessions.read().await;
    let partial = partial.to_lowercase();

    sessions
        .get(&user_id)
        .and_then(|analysis| analysis.record())
        .map(|record| {
            record
                .draft_names()
                .filter(|n| n.to_lowercase().contains(&partial))
                .take(25)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
