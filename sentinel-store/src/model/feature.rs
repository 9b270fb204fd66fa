use std::fmt;

/// Canonical per-guild feature toggles.
///
/// The declaration order is the order used for display and for the keys
/// written to disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    BanFunction,
    WelcomeMessages,
    AutoModeration,
    Logs,
    DmNotifications,
    AntiSpam,
    AutoRole,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::BanFunction,
        Feature::WelcomeMessages,
        Feature::AutoModeration,
        Feature::Logs,
        Feature::DmNotifications,
        Feature::AntiSpam,
        Feature::AutoRole,
    ];

    /// Storage key for this feature.
    pub const fn key(self) -> &'static str {
        match self {
            Feature::BanFunction => "ban_function",
            Feature::WelcomeMessages => "welcome_messages",
            Feature::AutoModeration => "auto_moderation",
            Feature::Logs => "logs",
            Feature::DmNotifications => "dm_notifications",
            Feature::AntiSpam => "anti_spam",
            Feature::AutoRole => "auto_role",
        }
    }

    /// Value used for a fresh guild or a missing key.
    pub const fn default_enabled(self) -> bool {
        match self {
            Feature::BanFunction => true,
            Feature::WelcomeMessages => true,
            Feature::AutoModeration => false,
            Feature::Logs => true,
            Feature::DmNotifications => true,
            Feature::AntiSpam => false,
            Feature::AutoRole => false,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Feature::BanFunction => "Ban System",
            Feature::WelcomeMessages => "Welcome Messages",
            Feature::AutoModeration => "Auto Moderation",
            Feature::Logs => "Logs",
            Feature::DmNotifications => "DM Notifications",
            Feature::AntiSpam => "Anti-Spam",
            Feature::AutoRole => "Auto Role",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Feature::BanFunction => "Allows banning members with a custom announcement.",
            Feature::WelcomeMessages => "Greets new members automatically.",
            Feature::AutoModeration => "Removes inappropriate messages automatically.",
            Feature::Logs => "Records bot actions in the process log.",
            Feature::DmNotifications => "Sends a direct message to members affected by actions.",
            Feature::AntiSpam => "Detects and removes spam.",
            Feature::AutoRole => "Assigns a role to new members automatically.",
        }
    }

    /// Resolve a storage key. Matching is exact.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.key() == key)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
