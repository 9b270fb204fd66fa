use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

pub const TOKEN_VAR: &str = "DISCORD_TOKEN";
pub const GUILD_ID_VAR: &str = "DISCORD_GUILD_ID";
pub const CONFIG_DIR_VAR: &str = "SENTINEL_CONFIG_DIR";
pub const LOG_FILE_VAR: &str = "SENTINEL_LOG_FILE";

pub const DEFAULT_CONFIG_DIR: &str = "configs";
pub const DEFAULT_LOG_FILE: &str = "bot.log";
pub const DOTENV_FILE: &str = ".env";

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Settings {
    pub token: String,
    /// Register slash commands in this guild only instead of globally.
    pub guild_id: Option<u64>,
    pub config_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), Path::new(DOTENV_FILE))
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        dotenv_path: &Path,
    ) -> anyhow::Result<Self> {
        let token = resolve_token(lookup(TOKEN_VAR), dotenv_path)?;

        let guild_id = match non_empty(lookup(GUILD_ID_VAR)) {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("{GUILD_ID_VAR} must be a numeric guild id"))?,
            ),
            None => None,
        };

        let config_dir = non_empty(lookup(CONFIG_DIR_VAR))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));

        Ok(Self {
            token,
            guild_id,
            config_dir,
        })
    }
}

/// Where to mirror logs. Unset means [`DEFAULT_LOG_FILE`]; an empty value
/// turns file logging off.
pub fn log_file_from_env() -> Option<PathBuf> {
    match env::var(LOG_FILE_VAR) {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(PathBuf::from(value.trim())),
        Err(_) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
    }
}

/// Take the token from the environment, falling back to `dotenv_path`.
pub fn resolve_token(from_env: Option<String>, dotenv_path: &Path) -> anyhow::Result<String> {
    if let Some(token) = non_empty(from_env) {
        return Ok(token);
    }

    if let Some(token) = token_from_dotenv(dotenv_path)? {
        return Ok(token);
    }

    anyhow::bail!(
        "Discord token not found. Set {TOKEN_VAR} in the environment or add `{TOKEN_VAR}=<token>` to {}",
        dotenv_path.display()
    )
}

fn token_from_dotenv(path: &Path) -> anyhow::Result<Option<String>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to open {}", path.display())),
    };

    for entry in entries {
        let (key, value) = entry.with_context(|| format!("failed to parse {}", path.display()))?;
        if key == TOKEN_VAR {
            return Ok(non_empty(Some(value)));
        }
    }

    Ok(None)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use super::{DEFAULT_CONFIG_DIR, Settings, resolve_token};

    fn missing_dotenv() -> PathBuf {
        PathBuf::from("/nonexistent/sentinel/.env")
    }

    #[test]
    fn environment_token_wins() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        std::fs::write(&dotenv, "DISCORD_TOKEN=from-file\n").unwrap();

        let token = resolve_token(Some("from-env".to_owned()), &dotenv).unwrap();
        assert_eq!(token, "from-env");
    }

    #[test]
    fn dotenv_file_is_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        std::fs::write(&dotenv, "# bot secrets\nOTHER=1\nDISCORD_TOKEN=from-file\n").unwrap();

        assert_eq!(resolve_token(None, &dotenv).unwrap(), "from-file");
        assert_eq!(resolve_token(Some("  ".to_owned()), &dotenv).unwrap(), "from-file");
    }

    #[test]
    fn missing_token_is_an_error_with_guidance() {
        let err = resolve_token(None, &missing_dotenv()).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn empty_token_in_dotenv_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        std::fs::write(&dotenv, "DISCORD_TOKEN=\n").unwrap();

        assert!(resolve_token(None, &dotenv).is_err());
    }

    #[test]
    fn settings_use_defaults_for_optional_values() {
        let vars = HashMap::from([("DISCORD_TOKEN", "abc")]);
        let settings =
            Settings::from_lookup(|key| vars.get(key).map(|v| v.to_string()), &missing_dotenv())
                .unwrap();

        assert_eq!(settings.token, "abc");
        assert_eq!(settings.guild_id, None);
        assert_eq!(settings.config_dir, Path::new(DEFAULT_CONFIG_DIR));
    }

    #[test]
    fn settings_parse_optional_values() {
        let vars = HashMap::from([
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_GUILD_ID", "123456789"),
            ("SENTINEL_CONFIG_DIR", "/var/lib/sentinel"),
        ]);
        let settings =
            Settings::from_lookup(|key| vars.get(key).map(|v| v.to_string()), &missing_dotenv())
                .unwrap();

        assert_eq!(settings.guild_id, Some(123_456_789));
        assert_eq!(settings.config_dir, Path::new("/var/lib/sentinel"));
    }

    #[test]
    fn malformed_guild_id_is_rejected() {
        let vars = HashMap::from([("DISCORD_TOKEN", "abc"), ("DISCORD_GUILD_ID", "main")]);
        let result =
            Settings::from_lookup(|key| vars.get(key).map(|v| v.to_string()), &missing_dotenv());

        assert!(result.is_err());
    }
}
