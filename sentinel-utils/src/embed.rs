use poise::serenity_prelude as serenity;

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0x34_98_DB;
/// Color for refusals, disabled features and destructive outcomes.
pub const DENIED_EMBED_COLOR: u32 = 0xE7_4C_3C;
/// Color for closed or expired interactive messages.
pub const MUTED_EMBED_COLOR: u32 = 0x95_A5_A6;
/// Color for expiry notices.
pub const EXPIRED_EMBED_COLOR: u32 = 0xE6_7E_22;

/// Discord rejects embed field values longer than this.
pub const EMBED_FIELD_MAX_CHARS: usize = 1024;

/// Titled embed with the default styling.
pub fn notice_embed(title: &str, description: impl Into<String>) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title.to_owned())
        .color(DEFAULT_EMBED_COLOR)
        .description(description)
}

/// Titled embed used to refuse an action.
pub fn denied_embed(title: &str, description: impl Into<String>) -> serenity::CreateEmbed {
    notice_embed(title, description).color(DENIED_EMBED_COLOR)
}
