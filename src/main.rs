mod advice;
mod commands;
mod llm;
mod nearby;
mod state;
mod translate;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tokio::sync::RwLock;
use tracing::{error, info, Level};

use advice::AdviceEngine;
use llm::LlmClient;
use nearby::geocoder::{Geocoder, GeocodingService, Nominatim, RateLimit};
use nearby::search::PlaceSearcher;
use state::AppState;
use translate::Translator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let token = dotenv::var("DISCORD_TOKEN").context("DISCORD_TOKEN required")?;
    let guild_id: Option<serenity::GuildId> = dotenv::var("DISCORD_GUILD_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::GuildId::new);

    // Advice pipeline
    let llm_client = Arc::new(LlmClient::from_env()?);
    info!(model = llm_client.model(), "LLM client initialized");
    let translator = Arc::new(Translator::from_env()?);
    let advice = Arc::new(AdviceEngine::new(llm_client, translator));

    // Locality pipeline: one throttled geocoding handle shared by both stages
    let limits = RateLimit::default();
    let geocoding = Arc::new(GeocodingService::new(Arc::new(Nominatim::from_env()?), limits));
    info!(?limits, "Geocoding service initialized");
    let geocoder = Arc::new(Geocoder::new(geocoding.clone()));
    let places = Arc::new(PlaceSearcher::new(geocoding.clone()));

    // Parse admin user IDs from env
    let admin_ids: HashSet<u64> = dotenv::var("ADMIN_USER_IDS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect();
    if !admin_ids.is_empty() {
        info!(count = admin_ids.len(), "Admin users configured");
    }

    let app_state = AppState {
        advice,
        geocoding,
        geocoder,
        places,
        admin_ids,
        sessions: Arc::new(RwLock::new(HashMap::new())),
        settings: Arc::new(RwLock::new(HashMap::new())),
    };

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::nyay()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        gid,
                    )
                    .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, &framework.options().commands)
                        .await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting NyaySathi Discord bot...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
