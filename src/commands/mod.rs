mod analyze;
mod debug;
mod draft;
mod manage;
mod nearby;
mod settings;

use crate::state::Context;

/// NyaySathi - legal help in your language
#[poise::command(
    slash_command,
    subcommands(
        "analyze::analyze",
        "draft::draft",
        "nearby::nearby",
        "settings::settings",
        "manage::clear",
        "debug::debug"
    )
)]
pub async fn nyay(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Discord rejects messages over 2000 characters.
const CHUNK_LIMIT: usize = 1990;

/// Send a message in Discord-safe chunks, splitting on newlines where possible.
/// Uses ctx.say() for all chunks so follow-ups go through the interaction webhook.
pub(crate) async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    for chunk in split_chunks(text, CHUNK_LIMIT) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

fn split_chunks(text: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let mut end = remaining.len().min(limit);
        while !remaining.is_char_boundary(end) {
            end -= 1;
        }
        let split_at = if end < remaining.len() {
            remaining[..end]
                .rfind('\n')
                .or_else(|| remaining[..end].rfind(' '))
                .map(|i| i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    chunks
}
