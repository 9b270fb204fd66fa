use poise::serenity_prelude as serenity;

use sentinel_store::{Feature, FeatureFlags};
use sentinel_utils::embed::{
    DEFAULT_EMBED_COLOR, EXPIRED_EMBED_COLOR, MUTED_EMBED_COLOR, notice_embed,
};
use sentinel_utils::formatting::format_compact_duration;

use crate::config::session::{PanelAction, PanelDenial, PanelSession};

/// Discord caps an action row at five buttons.
const BUTTONS_PER_ROW: usize = 5;

/// Custom ids for one panel message, all sharing a per-invocation prefix.
#[derive(Clone, Debug)]
pub struct PanelIds {
    prefix: String,
}

impl PanelIds {
    pub fn new(invocation_id: u64) -> Self {
        Self {
            prefix: format!("{}_panel", invocation_id),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn toggle(&self, feature: Feature) -> String {
        format!("{}_toggle_{}", self.prefix, feature.key())
    }

    pub fn details(&self) -> String {
        format!("{}_details", self.prefix)
    }

    pub fn refresh(&self) -> String {
        format!("{}_refresh", self.prefix)
    }

    pub fn close(&self) -> String {
        format!("{}_close", self.prefix)
    }

    /// Decode a custom id produced by this panel. Ids from other messages
    /// yield `None`.
    pub fn parse(&self, custom_id: &str) -> Option<PanelAction> {
        let rest = custom_id.strip_prefix(&self.prefix)?.strip_prefix('_')?;

        if let Some(key) = rest.strip_prefix("toggle_") {
            return Some(PanelAction::Toggle(key.to_owned()));
        }

        match rest {
            "details" => Some(PanelAction::Details),
            "refresh" => Some(PanelAction::Refresh),
            "close" => Some(PanelAction::Close),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonTone {
    On,
    Off,
    Primary,
    Secondary,
}

impl ButtonTone {
    fn style(self) -> serenity::ButtonStyle {
        match self {
            ButtonTone::On => serenity::ButtonStyle::Success,
            ButtonTone::Off => serenity::ButtonStyle::Danger,
            ButtonTone::Primary => serenity::ButtonStyle::Primary,
            ButtonTone::Secondary => serenity::ButtonStyle::Secondary,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelButton {
    pub custom_id: String,
    pub label: String,
    pub tone: ButtonTone,
}

/// One toggle per canonical feature followed by the details, refresh and
/// close controls.
pub fn panel_buttons(ids: &PanelIds, flags: &FeatureFlags) -> Vec<PanelButton> {
    let mut buttons: Vec<PanelButton> = flags
        .iter()
        .map(|(feature, enabled)| PanelButton {
            custom_id: ids.toggle(feature),
            label: format!("{}: {}", feature.label(), on_off(enabled)),
            tone: if enabled { ButtonTone::On } else { ButtonTone::Off },
        })
        .collect();

    buttons.push(PanelButton {
        custom_id: ids.details(),
        label: "Detailed Status".to_owned(),
        tone: ButtonTone::Primary,
    });
    buttons.push(PanelButton {
        custom_id: ids.refresh(),
        label: "Refresh".to_owned(),
        tone: ButtonTone::Secondary,
    });
    buttons.push(PanelButton {
        custom_id: ids.close(),
        label: "Close".to_owned(),
        tone: ButtonTone::Secondary,
    });

    buttons
}

pub fn panel_components(ids: &PanelIds, flags: &FeatureFlags) -> Vec<serenity::CreateActionRow> {
    panel_buttons(ids, flags)
        .chunks(BUTTONS_PER_ROW)
        .map(|row| {
            serenity::CreateActionRow::Buttons(
                row.iter()
                    .map(|button| {
                        serenity::CreateButton::new(&button.custom_id)
                            .label(&button.label)
                            .style(button.tone.style())
                    })
                    .collect(),
            )
        })
        .collect()
}

pub fn panel_embed(flags: &FeatureFlags, session: &PanelSession) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Control Panel")
        .description("Press a button to turn a feature on or off for this server.")
        .color(DEFAULT_EMBED_COLOR)
        .field(
            "Summary",
            format!("**Active:** {}", flags.status_summary()),
            false,
        )
        .field(
            "How it works",
            "Green buttons are on, red buttons are off.\nPress one to flip it.",
            true,
        )
        .field("Session", session_note(session), true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Guild ID: {}",
            flags.guild_id()
        )))
}

fn session_note(session: &PanelSession) -> String {
    format!(
        "Owner: <@{}>\nExpires after {} without input",
        session.owner_id(),
        format_compact_duration(session.idle_timeout().as_secs())
    )
}

pub fn details_embed(flags: &FeatureFlags) -> serenity::CreateEmbed {
    let description = flags
        .iter()
        .map(|(feature, enabled)| {
            format!(
                "**{}**\n{}\nStatus: {}",
                feature.label(),
                feature.description(),
                if enabled { "Active" } else { "Inactive" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    notice_embed("Detailed Feature Status", description).footer(serenity::CreateEmbedFooter::new(
        format!("Guild ID: {}", flags.guild_id()),
    ))
}

pub fn closed_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Control Panel Closed")
        .description(format!(
            "The panel was closed.\nUse `{}panel` to open it again.",
            sentinel_utils::COMMAND_PREFIX
        ))
        .color(MUTED_EMBED_COLOR)
}

pub fn expired_embed(session: &PanelSession) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Control Panel Expired")
        .description(format!(
            "The panel expired after {} of inactivity.\nUse `{}panel` to open a new one.",
            format_compact_duration(session.idle_timeout().as_secs()),
            sentinel_utils::COMMAND_PREFIX
        ))
        .color(EXPIRED_EMBED_COLOR)
}

pub fn superseded_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Control Panel Replaced")
        .description("A newer panel was opened; use that one instead.")
        .color(MUTED_EMBED_COLOR)
}

pub fn toggle_feedback(feature: Feature, enabled: bool) -> String {
    format!(
        "**{}** is now **{}**.",
        feature.label(),
        if enabled { "enabled" } else { "disabled" }
    )
}

pub fn denial_message(denial: PanelDenial) -> &'static str {
    match denial {
        PanelDenial::NotOwner => "Only the person who opened this panel can use it.",
        PanelDenial::Closed => "This panel has been closed.",
        PanelDenial::Expired => "This panel has expired. Open a new one to keep going.",
    }
}

pub fn unknown_feature_message(name: &str) -> String {
    format!("`{}` is not a known feature.", name)
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "On" } else { "Off" }
}

#[cfg(test)]
mod tests {
    use sentinel_store::{Feature, FeatureFlags};

    use super::{ButtonTone, PanelIds, panel_buttons, toggle_feedback};
    use crate::config::session::PanelAction;

    #[test]
    fn ids_round_trip_through_parse() {
        let ids = PanelIds::new(42);

        assert_eq!(
            ids.parse(&ids.toggle(Feature::DmNotifications)),
            Some(PanelAction::Toggle("dm_notifications".to_owned()))
        );
        assert_eq!(ids.parse(&ids.details()), Some(PanelAction::Details));
        assert_eq!(ids.parse(&ids.refresh()), Some(PanelAction::Refresh));
        assert_eq!(ids.parse(&ids.close()), Some(PanelAction::Close));
    }

    #[test]
    fn ids_from_other_invocations_are_ignored() {
        let ids = PanelIds::new(4);

        assert_eq!(ids.parse("42_panel_close"), None);
        assert_eq!(ids.parse("4_panelclose"), None);
        assert_eq!(ids.parse("4_panel_unknown"), None);
        assert_eq!(ids.parse("99_confirm"), None);
    }

    #[test]
    fn buttons_follow_flag_state() {
        let ids = PanelIds::new(1);
        let mut flags = FeatureFlags::defaults(5);
        flags.set(Feature::AntiSpam, true);

        let buttons = panel_buttons(&ids, &flags);
        assert_eq!(buttons.len(), 10);

        let anti_spam = buttons
            .iter()
            .find(|button| button.custom_id == ids.toggle(Feature::AntiSpam))
            .unwrap();
        assert_eq!(anti_spam.tone, ButtonTone::On);
        assert_eq!(anti_spam.label, "Anti-Spam: On");

        let auto_role = buttons
            .iter()
            .find(|button| button.custom_id == ids.toggle(Feature::AutoRole))
            .unwrap();
        assert_eq!(auto_role.tone, ButtonTone::Off);

        let controls: Vec<&str> = buttons[7..].iter().map(|b| b.label.as_str()).collect();
        assert_eq!(controls, vec!["Detailed Status", "Refresh", "Close"]);
    }

    #[test]
    fn feedback_mentions_new_state() {
        assert_eq!(
            toggle_feedback(Feature::Logs, false),
            "**Logs** is now **disabled**."
        );
    }
}
