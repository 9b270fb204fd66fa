/// Generic embed builders shared across commands.
pub mod embed;
/// Shared formatting helpers (durations, mention-safe text).
pub mod formatting;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Prefixes accepted in addition to [`COMMAND_PREFIX`].
pub const ADDITIONAL_PREFIXES: &[&str] = &["?", "."];
/// Permission and role hierarchy helpers.
pub mod permissions;
/// Shared time helpers.
pub mod time;
