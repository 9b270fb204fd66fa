mod events;
mod settings;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use sentinel_core::{Data, Error};
use sentinel_store::ConfigStore;
use sentinel_utils::embed::denied_embed;
use sentinel_utils::{ADDITIONAL_PREFIXES, COMMAND_PREFIX};

use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load the .env file before anything reads the environment
    dotenvy::dotenv().ok();

    let log_file = settings::log_file_from_env();
    let file_layer_error = init_tracing(log_file.as_deref());
    match (&log_file, file_layer_error) {
        (Some(path), None) => info!(path = %path.display(), "Logging to file."),
        (Some(path), Some(err)) => {
            warn!(?err, path = %path.display(), "Failed to open log file; logging to stdout only.")
        }
        (None, _) => info!("File logging disabled."),
    }

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            error!("{err:#}");
            return Err(err);
        }
    };

    let store = ConfigStore::new(settings.config_dir.clone());
    info!(config_dir = %store.root().display(), "Guild configuration store ready.");

    let guild_id = settings.guild_id;
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: sentinel_commands::commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handle_event(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(COMMAND_PREFIX.to_string()),
                additional_prefixes: ADDITIONAL_PREFIXES
                    .iter()
                    .copied()
                    .map(poise::Prefix::Literal)
                    .collect(),
                mention_as_prefix: false,
                case_insensitive_commands: true,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            let store = store.clone();
            Box::pin(async move {
                let commands = &framework.options().commands;
                match guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                        info!(guild_id, count = commands.len(), "Slash commands registered in guild.");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, commands).await?;
                        info!(count = commands.len(), "Slash commands registered globally.");
                    }
                }

                Ok(Data::new(store))
            })
        })
        .build();

    info!("Sentinel is connecting...");

    let mut client = serenity::ClientBuilder::new(settings.token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}

/// Console layer plus an optional plain-text file layer. Returns the open
/// error when the file could not be used, since logging is not up yet.
fn init_tracing(log_file: Option<&Path>) -> Option<std::io::Error> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(keep_event));

    let (file_layer, file_error) = match log_file.map(|path| {
        OpenOptions::new().create(true).append(true).open(path)
    }) {
        Some(Ok(file)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter_fn(keep_event)),
            ),
            None,
        ),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .init();

    file_error
}

fn keep_event(metadata: &tracing::Metadata<'_>) -> bool {
    let target = metadata.target();

    let within_info_level = *metadata.level() <= tracing::Level::INFO;
    if !within_info_level {
        return false;
    }

    !(target.starts_with("serenity::gateway::bridge::shard_manager")
        || target.starts_with("serenity::gateway::bridge::shard_runner"))
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(
                ?error,
                command = %ctx.command().qualified_name,
                guild_id = ctx.guild_id().map(|id| id.get()),
                "command error"
            );

            let embed = denied_embed(
                "Command Error",
                "Something went wrong while running this command.",
            );

            let _ = ctx
                .send(poise::CreateReply::default().ephemeral(true).embed(embed))
                .await;
        }
        poise::FrameworkError::ArgumentParse { ctx, input, .. } => {
            let usage = format!("Usage: `{}{}`", COMMAND_PREFIX, ctx.command().qualified_name);
            let description = if let Some(input) = input {
                format!("Invalid argument: `{}`\n{}", input, usage)
            } else {
                format!("Missing required argument.\n{}", usage)
            };

            let _ = ctx.say(description).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            error!(?other, "framework error");
        }
    }
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    _data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            events::lifecycle::handle_ready(ctx, data_about_bot);
        }
        serenity::FullEvent::GuildCreate { guild, is_new } => {
            events::lifecycle::handle_guild_create(guild, *is_new);
        }
        serenity::FullEvent::GuildDelete { incomplete, full } => {
            events::lifecycle::handle_guild_delete(incomplete, full.as_ref());
        }
        _ => {}
    }

    Ok(())
}
