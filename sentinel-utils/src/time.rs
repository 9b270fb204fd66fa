use std::time::{SystemTime, UNIX_EPOCH};

/// Return the current unix timestamp in seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

/// Discord timestamp markup rendered as a full date and time in the reader's locale.
pub fn discord_full_timestamp(unix_secs: u64) -> String {
    format!("<t:{}:F>", unix_secs)
}

#[cfg(test)]
mod tests {
    use super::discord_full_timestamp;

    #[test]
    fn full_timestamp_markup() {
        assert_eq!(discord_full_timestamp(1_700_000_000), "<t:1700000000:F>");
    }
}
