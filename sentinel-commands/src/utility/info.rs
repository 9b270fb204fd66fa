use std::time::Duration;

use poise::serenity_prelude as serenity;

use crate::moderation::embeds::guild_only_message;
use crate::{COMMANDS, CommandMeta};
use sentinel_core::{Context, Error};
use sentinel_store::StatusSummary;
use sentinel_utils::embed::DEFAULT_EMBED_COLOR;

pub const META: CommandMeta = CommandMeta {
    name: "info",
    desc: "Show bot status and this server's feature summary.",
    category: "utility",
    usage: "!info",
};

#[poise::command(
    prefix_command,
    slash_command,
    category = "Utility",
    aliases("status", "about")
)]
pub async fn info(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let flags = ctx.data().store.load(guild_id.get()).await;
    let latency = ctx.ping().await;

    let embed = serenity::CreateEmbed::new()
        .title("Bot Information")
        .color(DEFAULT_EMBED_COLOR)
        .field("Status", status_block(latency, flags.status_summary()), true)
        .field("Main Commands", commands_block(COMMANDS), true)
        .field(
            "Library",
            "Built with **poise** on **serenity** (Rust)",
            false,
        )
        .footer(
            serenity::CreateEmbedFooter::new(format!("Requested by {}", ctx.author().tag()))
                .icon_url(ctx.author().face()),
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn status_block(latency: Duration, summary: StatusSummary) -> String {
    let latency = if latency.is_zero() {
        "measuring...".to_owned()
    } else {
        format!("{}ms", latency.as_millis())
    };

    format!(
        "**Online:** yes\n**Latency:** {}\n**Features:** {} active",
        latency, summary
    )
}

fn commands_block(commands: &[CommandMeta]) -> String {
    commands
        .iter()
        .map(|command| format!("`{}{}` {}", sentinel_utils::COMMAND_PREFIX, command.name, command.desc))
        .collect::<Vec<_>>()
        .join("\n")
}
