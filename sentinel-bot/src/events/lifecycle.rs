use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use sentinel_utils::COMMAND_PREFIX;

pub fn presence_activity() -> serenity::ActivityData {
    serenity::ActivityData::watching(format!("{COMMAND_PREFIX}panel to configure"))
}

pub fn handle_ready(ctx: &serenity::Context, ready: &serenity::Ready) {
    info!(
        bot = %ready.user.name,
        bot_id = ready.user.id.get(),
        guilds = ready.guilds.len(),
        "Sentinel is online."
    );

    ctx.set_presence(Some(presence_activity()), serenity::OnlineStatus::Online);
}

/// `is_new` is only `Some(true)` for guilds joined after startup.
pub fn handle_guild_create(guild: &serenity::Guild, is_new: Option<bool>) {
    if is_new == Some(true) {
        info!(
            guild_id = guild.id.get(),
            guild = %guild.name,
            members = guild.member_count,
            "joined guild"
        );
    }
}

pub fn handle_guild_delete(incomplete: &serenity::UnavailableGuild, full: Option<&serenity::Guild>) {
    if incomplete.unavailable {
        debug!(guild_id = incomplete.id.get(), "guild became unavailable");
        return;
    }

    match full {
        Some(guild) => info!(guild_id = guild.id.get(), guild = %guild.name, "left guild"),
        None => info!(guild_id = incomplete.id.get(), "left guild"),
    }
}
