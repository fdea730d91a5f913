use crate::state::Context;

/// Show runtime diagnostics (admin only)
#[poise::command(slash_command, guild_only)]
pub async fn debug(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    let data = ctx.data();
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| format!("unavailable ({})", e));
    let env_present = std::path::Path::new(".env").exists();
    let limits = data.geocoding.limits();
    let active_sessions = data.sessions.read().await.len();

    ctx.say(format!(
        "**Settings / Debug**\n\
         Working directory: `{}`\n\
         `.env` present: {}\n\
         API key loaded length: {}\n\
         Model: `{}`\n\
         Geocoder: {:?} min delay, {} retries, {:?} error wait\n\
         Stored analyses: {}",
        cwd,
        env_present,
        data.advice.llm().api_key_len(),
        data.advice.llm().model(),
        limits.min_delay,
        limits.max_retries,
        limits.error_wait,
        active_sessions
    ))
    .await?;

    Ok(())
}
