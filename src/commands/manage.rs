use crate::state::Context;

/// Forget your last analysis
#[poise::command(slash_command, guild_only)]
pub async fn clear(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let removed = ctx
        .data()
        .sessions
        .write()
        .await
        .remove(&ctx.author().id.get())
        .is_some();

    if removed {
        ctx.say("Session cleared.").await?;
    } else {
        ctx.say("Nothing to clear.").await?;
    }
    Ok(())
}
