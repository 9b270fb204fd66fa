use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::flags::FeatureFlags;
use crate::model::Feature;
use crate::persist::{JsonFileStore, StoredConfig};

type GuildSlot = Arc<Mutex<Option<FeatureFlags>>>;

/// Shared handle to the per-guild feature flag registry.
///
/// Entries are populated lazily on first use and stay resident for the
/// lifetime of the process. Every operation on a guild holds that guild's
/// lock until its file write has finished, so toggles on the same guild are
/// applied one at a time.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    files: JsonFileStore,
    guilds: Mutex<HashMap<u64, GuildSlot>>,
}

impl ConfigStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                files: JsonFileStore::new(dir),
                guilds: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        self.inner.files.root()
    }

    /// Location of a guild's config file.
    pub fn path_for(&self, guild_id: u64) -> PathBuf {
        self.inner.files.path_for(guild_id)
    }

    /// Current flags for a guild, hydrating from disk on first access.
    ///
    /// Never fails: unreadable or corrupt files degrade to defaults.
    pub async fn load(&self, guild_id: u64) -> FeatureFlags {
        let slot = self.slot(guild_id).await;
        let mut resident = slot.lock().await;

        if let Some(flags) = resident.as_ref() {
            return flags.clone();
        }

        let flags = self.hydrate(guild_id).await;
        *resident = Some(flags.clone());
        flags
    }

    /// Re-read a guild's file even if it is already resident, picking up
    /// edits made outside the process.
    pub async fn reload(&self, guild_id: u64) -> FeatureFlags {
        let slot = self.slot(guild_id).await;
        let mut resident = slot.lock().await;

        let flags = self.hydrate(guild_id).await;
        *resident = Some(flags.clone());
        flags
    }

    /// Flip a feature by storage key and persist it.
    ///
    /// Returns the new value, or `None` without touching anything when `name`
    /// is not a canonical feature.
    pub async fn toggle(&self, guild_id: u64, name: &str) -> Option<bool> {
        let feature = Feature::from_key(name)?;
        Some(self.toggle_feature(guild_id, feature).await)
    }

    /// Flip a canonical feature and persist it, returning the new value.
    pub async fn toggle_feature(&self, guild_id: u64, feature: Feature) -> bool {
        let slot = self.slot(guild_id).await;
        let mut resident = slot.lock().await;

        let mut flags = match resident.take() {
            Some(flags) => flags,
            None => self.hydrate(guild_id).await,
        };
        let enabled = flags.toggle(feature);
        self.save(&flags).await;
        *resident = Some(flags);

        enabled
    }

    pub async fn is_enabled(&self, guild_id: u64, feature: Feature) -> bool {
        self.load(guild_id).await.is_enabled(feature)
    }

    async fn slot(&self, guild_id: u64) -> GuildSlot {
        let mut guilds = self.inner.guilds.lock().await;
        guilds.entry(guild_id).or_default().clone()
    }

    async fn hydrate(&self, guild_id: u64) -> FeatureFlags {
        let files = &self.inner.files;

        let flags = match files.read(guild_id).await {
            StoredConfig::Loaded { flags, backfilled } => {
                if !backfilled.is_empty() {
                    let keys: Vec<&str> = backfilled.iter().map(|feature| feature.key()).collect();
                    info!(guild_id, ?keys, "backfilled missing feature flags with defaults");
                }
                flags
            }
            StoredConfig::Missing => {
                debug!(guild_id, "no stored config; starting from defaults");
                FeatureFlags::defaults(guild_id)
            }
            StoredConfig::Unreadable(source) => {
                error!(?source, guild_id, "failed to read guild config; using defaults");
                FeatureFlags::defaults(guild_id)
            }
            StoredConfig::Corrupt(source) => {
                error!(?source, guild_id, "guild config is not a valid JSON object; using defaults");
                match files.quarantine(guild_id).await {
                    Ok(moved_to) => {
                        warn!(guild_id, moved_to = %moved_to.display(), "kept a copy of the corrupt config")
                    }
                    Err(e) => warn!(?e, guild_id, "failed to keep a copy of the corrupt config"),
                }
                FeatureFlags::defaults(guild_id)
            }
        };

        self.save(&flags).await;
        flags
    }

    /// Write the full mapping for `flags`. Callers hold the guild's lock.
    ///
    /// A failed write is logged; the in-memory value still wins for the rest
    /// of the process lifetime.
    async fn save(&self, flags: &FeatureFlags) {
        if let Err(e) = self.inner.files.write(flags).await {
            error!(?e, guild_id = flags.guild_id(), "failed to save guild config");
        }
    }
}
