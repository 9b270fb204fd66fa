use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::model::Feature;

/// Feature toggles for one guild.
///
/// Every canonical [`Feature`] always has a value. Keys found on disk that
/// are not canonical are carried along untouched so older or newer builds can
/// share the same file.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureFlags {
    guild_id: u64,
    enabled: [bool; Feature::ALL.len()],
    extra: Map<String, Value>,
}

/// `active/total` count over the canonical features.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSummary {
    pub active: usize,
    pub total: usize,
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.active, self.total)
    }
}

impl FeatureFlags {
    pub fn defaults(guild_id: u64) -> Self {
        Self {
            guild_id,
            enabled: Feature::ALL.map(Feature::default_enabled),
            extra: Map::new(),
        }
    }

    /// Merge a stored object over the defaults.
    ///
    /// Returns the merged flags and the canonical features that had to be
    /// filled in, either because the key was missing or because it did not
    /// hold a boolean.
    pub fn from_stored(guild_id: u64, stored: Map<String, Value>) -> (Self, Vec<Feature>) {
        let mut flags = Self::defaults(guild_id);
        let mut seen = [false; Feature::ALL.len()];

        for (key, value) in stored {
            match Feature::from_key(&key) {
                Some(feature) => {
                    if let Value::Bool(enabled) = value {
                        flags.enabled[feature as usize] = enabled;
                        seen[feature as usize] = true;
                    }
                }
                None => {
                    flags.extra.insert(key, value);
                }
            }
        }

        let backfilled = Feature::ALL
            .into_iter()
            .filter(|feature| !seen[*feature as usize])
            .collect();

        (flags, backfilled)
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled[feature as usize]
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        self.enabled[feature as usize] = enabled;
    }

    /// Flip one feature and return its new value.
    pub fn toggle(&mut self, feature: Feature) -> bool {
        let slot = &mut self.enabled[feature as usize];
        *slot = !*slot;
        *slot
    }

    pub fn status_summary(&self) -> StatusSummary {
        StatusSummary {
            active: self.enabled.iter().filter(|enabled| **enabled).count(),
            total: self.enabled.len(),
        }
    }

    /// Canonical features paired with their current value, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, bool)> + '_ {
        Feature::ALL
            .into_iter()
            .map(|feature| (feature, self.is_enabled(feature)))
    }

    /// Non-canonical keys preserved from storage.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for FeatureFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.enabled.len() + self.extra.len()))?;
        for (feature, enabled) in self.iter() {
            map.serialize_entry(feature.key(), &enabled)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::{FeatureFlags, StatusSummary};
    use crate::model::Feature;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn defaults_summary_counts_enabled_features() {
        let flags = FeatureFlags::defaults(1);
        assert_eq!(flags.status_summary(), StatusSummary { active: 4, total: 7 });
        assert_eq!(flags.status_summary().to_string(), "4/7");
    }

    #[test]
    fn partial_object_is_backfilled_and_keeps_stored_values() {
        let (flags, backfilled) =
            FeatureFlags::from_stored(9, object(json!({ "ban_function": false })));

        assert!(!flags.is_enabled(Feature::BanFunction));
        assert!(flags.is_enabled(Feature::Logs));
        assert_eq!(backfilled.len(), 6);
        assert!(!backfilled.contains(&Feature::BanFunction));
    }

    #[test]
    fn non_boolean_canonical_values_fall_back_to_defaults() {
        let (flags, backfilled) =
            FeatureFlags::from_stored(9, object(json!({ "anti_spam": "yes", "logs": false })));

        assert!(!flags.is_enabled(Feature::AntiSpam));
        assert!(!flags.is_enabled(Feature::Logs));
        assert!(backfilled.contains(&Feature::AntiSpam));
        assert!(!backfilled.contains(&Feature::Logs));
    }

    #[test]
    fn unknown_keys_survive_serialization() {
        let (flags, _) = FeatureFlags::from_stored(
            3,
            object(json!({ "legacy_mode": true, "note": "keep me" })),
        );
        assert_eq!(flags.extra().len(), 2);

        let written: Value = serde_json::from_str(&flags.to_pretty_json().unwrap()).unwrap();
        assert_eq!(written["legacy_mode"], json!(true));
        assert_eq!(written["note"], json!("keep me"));
        assert_eq!(written.as_object().unwrap().len(), 9);
        assert_eq!(flags.status_summary().total, 7);
    }

    #[test]
    fn toggle_is_self_inverse() {
        let mut flags = FeatureFlags::defaults(1);
        for feature in Feature::ALL {
            let before = flags.is_enabled(feature);
            assert_eq!(flags.toggle(feature), !before);
            assert_eq!(flags.toggle(feature), before);
        }
        assert_eq!(flags, FeatureFlags::defaults(1));
    }

    #[test]
    fn serialized_keys_start_with_canonical_order() {
        let json = FeatureFlags::defaults(1).to_pretty_json().unwrap();
        let first = json.find("ban_function").unwrap();
        let last = json.find("auto_role").unwrap();
        assert!(first < last);
        assert!(json.contains("\n  \"logs\": true"));
    }
}
