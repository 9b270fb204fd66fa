use poise::serenity_prelude as serenity;

use sentinel_utils::embed::{DENIED_EMBED_COLOR, EMBED_FIELD_MAX_CHARS, denied_embed};
use sentinel_utils::formatting::{neutralize_mentions, truncate_chars};
use sentinel_utils::time::discord_full_timestamp;

use crate::moderation::gate::Notification;

/// Room taken by the code fence around the announced reason.
const CODE_FENCE_CHARS: usize = 6;

/// Discord JSON error code for "Cannot send messages to this user".
const CANNOT_MESSAGE_USER: isize = 50007;
/// Discord JSON error code for "Missing Permissions".
const MISSING_PERMISSIONS: isize = 50013;

pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{usage}`")
}

pub fn guild_only_message() -> &'static str {
    "This command only works in servers."
}

pub fn feature_disabled_embed() -> serenity::CreateEmbed {
    denied_embed(
        "Feature Disabled",
        format!(
            "The ban system is **disabled** for this server.\nUse `{}panel` to turn it on.",
            sentinel_utils::COMMAND_PREFIX
        ),
    )
}

/// Public announcement posted after a successful ban.
pub fn ban_announcement_embed(
    target: &serenity::User,
    moderator: &serenity::User,
    reason: &str,
    banned_at_unix: u64,
    notification: Notification,
) -> serenity::CreateEmbed {
    let display_name = target.global_name.as_deref().unwrap_or(&target.name);

    serenity::CreateEmbed::new()
        .title("Member Banned")
        .description(format!(
            "**{}** has been shown the door.",
            neutralize_mentions(display_name)
        ))
        .color(DENIED_EMBED_COLOR)
        .thumbnail(target.face())
        .field(
            "Banned User",
            format!("<@{}>\n`{} ({})`", target.id.get(), target.tag(), target.id.get()),
            true,
        )
        .field(
            "Moderator",
            format!("<@{}>\n`{}`", moderator.id.get(), moderator.tag()),
            true,
        )
        .field("Reason", announcement_reason(reason), false)
        .field("Date & Time", discord_full_timestamp(banned_at_unix), false)
        .footer(serenity::CreateEmbedFooter::new(notification_footer(
            notification,
        )))
}

fn announcement_reason(reason: &str) -> String {
    let fenced = reason.replace("```", "'''");
    format!(
        "```{}```",
        truncate_chars(&fenced, EMBED_FIELD_MAX_CHARS - CODE_FENCE_CHARS)
    )
}

fn notice_reason(reason: &str) -> String {
    truncate_chars(&neutralize_mentions(reason), EMBED_FIELD_MAX_CHARS).to_owned()
}

fn notification_footer(notification: Notification) -> &'static str {
    match notification {
        Notification::Delivered => "The member was notified by direct message.",
        Notification::Undeliverable => "The member could not be notified (DMs closed).",
        Notification::Unknown => "The member could not be notified.",
        Notification::Skipped => "DM notifications are disabled for this server.",
    }
}

/// Direct message sent to the member just before the ban.
pub fn ban_notice_embed(
    guild_name: &str,
    reason: &str,
    moderator_tag: &str,
    banned_at_unix: u64,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("You have been banned")
        .description(format!("You have been banned from **{}**.", guild_name))
        .color(DENIED_EMBED_COLOR)
        .field("Reason", notice_reason(reason), false)
        .field("Moderator", moderator_tag.to_owned(), false)
        .field("Date", discord_full_timestamp(banned_at_unix), false)
        .footer(serenity::CreateEmbedFooter::new(
            "If you believe this ban was unfair, contact the server staff.",
        ))
}

/// Discord answered with 403, which covers closed DMs and missing permissions.
pub fn is_forbidden_error(source: &serenity::Error) -> bool {
    matches!(
        source,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 403
                || response.error.code == CANNOT_MESSAGE_USER
                || response.error.code == MISSING_PERMISSIONS
    )
}
