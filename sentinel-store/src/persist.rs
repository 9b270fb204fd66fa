use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde_json::{Map, Value};

use crate::flags::FeatureFlags;
use crate::model::Feature;

/// Result of reading one guild's file.
#[derive(Debug)]
pub(crate) enum StoredConfig {
    Missing,
    Loaded {
        flags: FeatureFlags,
        backfilled: Vec<Feature>,
    },
    Unreadable(io::Error),
    Corrupt(serde_json::Error),
}

/// One pretty-printed JSON object per guild under a root directory.
#[derive(Clone, Debug)]
pub(crate) struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn path_for(&self, guild_id: u64) -> PathBuf {
        self.root.join(format!("config_{guild_id}.json"))
    }

    pub(crate) async fn read(&self, guild_id: u64) -> StoredConfig {
        let raw = match tokio::fs::read(self.path_for(guild_id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return StoredConfig::Missing,
            Err(e) => return StoredConfig::Unreadable(e),
        };

        // Bytes that are not UTF-8 fail here too and count as corrupt.
        match serde_json::from_slice::<Map<String, Value>>(&raw) {
            Ok(stored) => {
                let (flags, backfilled) = FeatureFlags::from_stored(guild_id, stored);
                StoredConfig::Loaded { flags, backfilled }
            }
            Err(e) => StoredConfig::Corrupt(e),
        }
    }

    /// Replace the guild's file. The payload goes to a sibling temp file
    /// first so a crash mid-write never leaves a truncated config behind.
    pub(crate) async fn write(&self, flags: &FeatureFlags) -> anyhow::Result<()> {
        let path = self.path_for(flags.guild_id());
        let tmp_path = path.with_extension("json.tmp");
        let payload = flags
            .to_pretty_json()
            .context("failed to serialize feature flags")?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create `{}`", self.root.display()))?;
        tokio::fs::write(&tmp_path, payload)
            .await
            .with_context(|| format!("failed to write `{}`", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("failed to move config into `{}`", path.display()))?;

        Ok(())
    }

    /// Move an unparseable file out of the way and return where it went.
    /// Earlier copies are never replaced; later ones get a numeric suffix.
    pub(crate) async fn quarantine(&self, guild_id: u64) -> anyhow::Result<PathBuf> {
        let path = self.path_for(guild_id);
        let mut target = path.with_extension("json.corrupt");
        let mut attempt = 1_u32;
        while tokio::fs::try_exists(&target)
            .await
            .with_context(|| format!("failed to inspect `{}`", target.display()))?
        {
            target = path.with_extension(format!("json.corrupt.{attempt}"));
            attempt += 1;
        }

        tokio::fs::rename(&path, &target)
            .await
            .with_context(|| format!("failed to move `{}` aside", path.display()))?;
        Ok(target)
    }
}
