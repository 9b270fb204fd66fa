use std::time::{Duration, Instant};

use sentinel_store::{ConfigStore, Feature, FeatureFlags};

/// Idle time after which a control panel stops accepting input.
pub const PANEL_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelState {
    Open,
    /// Same as `Open`, last re-synced from disk.
    Refreshed,
    Closed,
    Expired,
}

impl PanelState {
    pub fn is_live(self) -> bool {
        matches!(self, PanelState::Open | PanelState::Refreshed)
    }
}

/// A button press decoded from its custom id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelAction {
    Toggle(String),
    Details,
    Refresh,
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelDenial {
    NotOwner,
    Closed,
    Expired,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PanelOutcome {
    Toggled {
        feature: Feature,
        enabled: bool,
        flags: FeatureFlags,
    },
    UnknownFeature(String),
    Details(FeatureFlags),
    Refreshed(FeatureFlags),
    Closed,
    Denied(PanelDenial),
}

/// Control panel state for one owner in one guild.
///
/// The session never owns the flags; it reaches them through the
/// [`ConfigStore`] by guild id. Only interactions from the owner are accepted
/// and only accepted interactions push the idle deadline back.
#[derive(Clone, Debug)]
pub struct PanelSession {
    guild_id: u64,
    owner_id: u64,
    last_accepted: Instant,
    idle_timeout: Duration,
    state: PanelState,
}

impl PanelSession {
    pub fn open(guild_id: u64, owner_id: u64, now: Instant) -> Self {
        Self {
            guild_id,
            owner_id,
            last_accepted: now,
            idle_timeout: PANEL_IDLE_TIMEOUT,
            state: PanelState::Open,
        }
    }

    pub fn owner_id(&self) -> u64 {
        self.owner_id
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn deadline(&self) -> Instant {
        self.last_accepted + self.idle_timeout
    }

    /// Time left before the session expires, zero once it is no longer live.
    pub fn remaining(&self, now: Instant) -> Duration {
        if !self.state.is_live() {
            return Duration::ZERO;
        }
        self.deadline().saturating_duration_since(now)
    }

    /// Move a live session to `Expired` once its deadline has passed.
    /// Returns whether the session is expired afterwards.
    pub fn expire_if_idle(&mut self, now: Instant) -> bool {
        if self.state.is_live() && now >= self.deadline() {
            self.state = PanelState::Expired;
        }
        self.state == PanelState::Expired
    }

    /// Expire unconditionally, e.g. when the interaction wait timed out.
    pub fn expire(&mut self) {
        if self.state.is_live() {
            self.state = PanelState::Expired;
        }
    }

    /// Close without an owner request, e.g. when a newer panel replaces this one.
    pub fn close(&mut self) {
        if self.state.is_live() {
            self.state = PanelState::Closed;
        }
    }

    fn admit(&mut self, actor_id: u64, now: Instant) -> Result<(), PanelDenial> {
        if self.expire_if_idle(now) {
            return Err(PanelDenial::Expired);
        }
        if self.state == PanelState::Closed {
            return Err(PanelDenial::Closed);
        }
        if actor_id != self.owner_id {
            return Err(PanelDenial::NotOwner);
        }

        self.last_accepted = now;
        Ok(())
    }

    /// Apply one interaction.
    pub async fn handle(
        &mut self,
        store: &ConfigStore,
        actor_id: u64,
        action: PanelAction,
        now: Instant,
    ) -> PanelOutcome {
        if let Err(denial) = self.admit(actor_id, now) {
            return PanelOutcome::Denied(denial);
        }

        match action {
            PanelAction::Toggle(name) => {
                let Some(enabled) = store.toggle(self.guild_id, &name).await else {
                    return PanelOutcome::UnknownFeature(name);
                };
                self.state = PanelState::Open;
                let flags = store.load(self.guild_id).await;
                match Feature::from_key(&name) {
                    Some(feature) => PanelOutcome::Toggled {
                        feature,
                        enabled,
                        flags,
                    },
                    None => PanelOutcome::UnknownFeature(name),
                }
            }
            PanelAction::Details => PanelOutcome::Details(store.load(self.guild_id).await),
            PanelAction::Refresh => {
                let flags = store.reload(self.guild_id).await;
                self.state = PanelState::Refreshed;
                PanelOutcome::Refreshed(flags)
            }
            PanelAction::Close => {
                self.state = PanelState::Closed;
                PanelOutcome::Closed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use sentinel_store::{ConfigStore, Feature};

    use super::{PANEL_IDLE_TIMEOUT, PanelAction, PanelDenial, PanelOutcome, PanelSession, PanelState};

    const GUILD: u64 = 77;
    const OWNER: u64 = 1000;
    const INTRUDER: u64 = 2000;

    fn toggle(feature: Feature) -> PanelAction {
        PanelAction::Toggle(feature.key().to_owned())
    }

    #[tokio::test]
    async fn owner_toggle_flips_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);

        let outcome = session
            .handle(&store, OWNER, toggle(Feature::AntiSpam), start)
            .await;

        match outcome {
            PanelOutcome::Toggled { feature, enabled, flags } => {
                assert_eq!(feature, Feature::AntiSpam);
                assert!(enabled);
                assert!(flags.is_enabled(Feature::AntiSpam));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let reopened = ConfigStore::new(dir.path());
        assert!(reopened.is_enabled(GUILD, Feature::AntiSpam).await);
    }

    #[tokio::test]
    async fn non_owner_is_denied_for_every_action_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);
        store.load(GUILD).await;
        let before = std::fs::read(store.path_for(GUILD)).unwrap();

        for action in [
            toggle(Feature::BanFunction),
            PanelAction::Details,
            PanelAction::Refresh,
            PanelAction::Close,
        ] {
            let outcome = session.handle(&store, INTRUDER, action, start).await;
            assert_eq!(outcome, PanelOutcome::Denied(PanelDenial::NotOwner));
        }

        assert_eq!(session.state(), PanelState::Open);
        assert_eq!(std::fs::read(store.path_for(GUILD)).unwrap(), before);
    }

    #[tokio::test]
    async fn idle_session_expires_and_rejects_the_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);
        let later = start + PANEL_IDLE_TIMEOUT;

        assert_eq!(session.remaining(later), Duration::ZERO);

        let outcome = session
            .handle(&store, OWNER, toggle(Feature::Logs), later)
            .await;
        assert_eq!(outcome, PanelOutcome::Denied(PanelDenial::Expired));
        assert_eq!(session.state(), PanelState::Expired);
        assert!(store.is_enabled(GUILD, Feature::Logs).await);
    }

    #[tokio::test]
    async fn accepted_interactions_push_the_deadline_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);

        let four_minutes = start + Duration::from_secs(4 * 60);
        session.handle(&store, OWNER, PanelAction::Details, four_minutes).await;

        let eight_minutes = start + Duration::from_secs(8 * 60);
        assert!(!session.expire_if_idle(eight_minutes));
        assert_eq!(session.remaining(eight_minutes), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn rejected_interactions_do_not_extend_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);

        let four_minutes = start + Duration::from_secs(4 * 60);
        session.handle(&store, INTRUDER, PanelAction::Details, four_minutes).await;

        assert!(session.expire_if_idle(start + PANEL_IDLE_TIMEOUT));
    }

    #[tokio::test]
    async fn closed_session_rejects_further_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);

        assert_eq!(
            session.handle(&store, OWNER, PanelAction::Close, start).await,
            PanelOutcome::Closed
        );
        assert_eq!(
            session
                .handle(&store, OWNER, toggle(Feature::AutoRole), start)
                .await,
            PanelOutcome::Denied(PanelDenial::Closed)
        );
        assert!(!store.is_enabled(GUILD, Feature::AutoRole).await);
        assert_eq!(session.remaining(start), Duration::ZERO);
    }

    #[tokio::test]
    async fn refresh_picks_up_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);
        store.load(GUILD).await;

        std::fs::write(store.path_for(GUILD), r#"{"welcome_messages": false}"#).unwrap();

        match session.handle(&store, OWNER, PanelAction::Refresh, start).await {
            PanelOutcome::Refreshed(flags) => {
                assert!(!flags.is_enabled(Feature::WelcomeMessages))
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(session.state(), PanelState::Refreshed);

        session
            .handle(&store, OWNER, toggle(Feature::WelcomeMessages), start)
            .await;
        assert_eq!(session.state(), PanelState::Open);
    }

    #[tokio::test]
    async fn unknown_feature_is_reported_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);
        let before = store.load(GUILD).await;

        let outcome = session
            .handle(&store, OWNER, PanelAction::Toggle("turbo".to_owned()), start)
            .await;

        assert_eq!(outcome, PanelOutcome::UnknownFeature("turbo".to_owned()));
        assert_eq!(store.load(GUILD).await, before);
    }

    #[test]
    fn superseded_session_is_closed() {
        let start = Instant::now();
        let mut session = PanelSession::open(GUILD, OWNER, start);
        session.close();
        assert_eq!(session.state(), PanelState::Closed);

        session.expire();
        assert_eq!(session.state(), PanelState::Closed);
    }
}
