use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

type PanelKey = (u64, u64);

/// Tracks the live control panel for each (guild, user) pair.
///
/// Claiming a pair that already has a live panel signals the older one so it
/// can release its controls.
#[derive(Clone, Debug, Default)]
pub struct PanelRegistry {
    live: Arc<Mutex<HashMap<PanelKey, Arc<Notify>>>>,
}

/// Proof that a panel is the current one for its pair. Dropping the lease
/// unregisters it unless a newer panel already took its place.
#[derive(Debug)]
pub struct PanelLease {
    key: PanelKey,
    signal: Arc<Notify>,
    registry: PanelRegistry,
}

impl PanelRegistry {
    pub fn claim(&self, guild_id: u64, user_id: u64) -> PanelLease {
        let key = (guild_id, user_id);
        let signal = Arc::new(Notify::new());

        if let Some(previous) = self.lock().insert(key, signal.clone()) {
            previous.notify_one();
        }

        PanelLease {
            key,
            signal,
            registry: self.clone(),
        }
    }

    #[cfg(test)]
    fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PanelKey, Arc<Notify>>> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PanelLease {
    /// Resolves once a newer panel has been opened for the same pair.
    pub async fn superseded(&self) {
        self.signal.notified().await;
    }

    #[cfg(test)]
    fn is_current(&self) -> bool {
        self.holds(&self.registry.lock())
    }

    fn holds(&self, live: &HashMap<PanelKey, Arc<Notify>>) -> bool {
        live.get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.signal))
    }
}

impl Drop for PanelLease {
    fn drop(&mut self) {
        let mut live = self.registry.lock();
        if self.holds(&live) {
            live.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::PanelRegistry;

    #[tokio::test]
    async fn newer_claim_supersedes_older_one() {
        let registry = PanelRegistry::default();
        let first = registry.claim(1, 10);
        let second = registry.claim(1, 10);

        tokio::time::timeout(Duration::from_secs(1), first.superseded())
            .await
            .expect("older panel should be signalled");
        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[tokio::test]
    async fn different_users_do_not_interfere() {
        let registry = PanelRegistry::default();
        let first = registry.claim(1, 10);
        let _other_user = registry.claim(1, 11);
        let _other_guild = registry.claim(2, 10);

        let waited = tokio::time::timeout(Duration::from_millis(50), first.superseded()).await;
        assert!(waited.is_err());
        assert_eq!(registry.live_count(), 3);
    }

    #[test]
    fn dropping_stale_lease_keeps_newer_registration() {
        let registry = PanelRegistry::default();
        let first = registry.claim(1, 10);
        let second = registry.claim(1, 10);

        drop(first);
        assert!(second.is_current());
        assert_eq!(registry.live_count(), 1);

        drop(second);
        assert_eq!(registry.live_count(), 0);
    }
}
