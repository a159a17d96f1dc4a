//! Eligibility sources — should the prompt ever be shown right now?
//!
//! Two interchangeable mechanisms, chosen at composition time:
//! `FlagEligibility` samples the remotely configured rollout flag;
//! `SignalEligibility` follows a per-user `action` value pushed through a
//! standing record subscription while the screen is visible.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::flags::RemoteFlagSource;
use crate::keys;
use crate::session::SessionTracker;
use crate::store::Subscription;

#[async_trait]
pub trait EligibilitySource: Send + Sync {
    /// Screen became visible. Installing twice is a safe no-op.
    async fn install(&self);

    /// Screen was hidden. Tearing down without an install is a safe no-op.
    fn teardown(&self);

    /// Sampled at each lifecycle signal, never cached by the policy.
    async fn is_eligible(&self) -> bool;
}

/// Poll-once eligibility from the remote flag source (the primary variant).
pub struct FlagEligibility {
    flags: Arc<dyn RemoteFlagSource>,
}

impl FlagEligibility {
    pub fn new(flags: Arc<dyn RemoteFlagSource>) -> Self {
        Self { flags }
    }
}

#[async_trait]
impl EligibilitySource for FlagEligibility {
    async fn install(&self) {}

    fn teardown(&self) {}

    async fn is_eligible(&self) -> bool {
        self.flags.get_bool(keys::REMOTE_LABEL_DATA)
    }
}

/// Subscription-based eligibility: the backend pushes `action = 1` on the
/// user's record when it decides now is the moment to prompt.
pub struct SignalEligibility {
    session: Arc<SessionTracker>,
    subscription: Mutex<Option<Subscription>>,
}

impl SignalEligibility {
    pub fn new(session: Arc<SessionTracker>) -> Self {
        Self {
            session,
            subscription: Mutex::new(None),
        }
    }
}

#[async_trait]
impl EligibilitySource for SignalEligibility {
    async fn install(&self) {
        let mut subscription = self.subscription.lock().expect("signal lock poisoned");
        if subscription.is_some() {
            return;
        }
        // No session yet means no subscription; a later install retries.
        if let Some(handle) = self.session.record_handle() {
            *subscription = Some(handle.subscribe(keys::ACTION));
        }
    }

    fn teardown(&self) {
        // Dropping the handle cancels the standing subscription.
        if let Some(subscription) = self
            .subscription
            .lock()
            .expect("signal lock poisoned")
            .take()
        {
            subscription.cancel();
        }
    }

    async fn is_eligible(&self) -> bool {
        self.subscription
            .lock()
            .expect("signal lock poisoned")
            .as_ref()
            .map(|s| s.current() == Some(1.0))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AnonymousAuth;
    use crate::flags::{default_flags, StaticFlagSource};
    use crate::store::memory::MemoryRecordStore;
    use crate::store::RemoteRecordStore;

    async fn ready_session() -> (Arc<SessionTracker>, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = SessionTracker::spawn(Arc::new(AnonymousAuth::new()), store.clone());
        tracker.ready().await;
        (tracker, store)
    }

    #[tokio::test]
    async fn flag_eligibility_follows_label_data() {
        let flags = Arc::new(StaticFlagSource::new(default_flags()));
        let source = FlagEligibility::new(flags.clone());

        source.install().await;
        assert!(!source.is_eligible().await);

        flags.set(keys::REMOTE_LABEL_DATA, true);
        assert!(source.is_eligible().await);
        source.teardown();
    }

    #[tokio::test]
    async fn signal_eligibility_tracks_pushed_action() {
        let (tracker, store) = ready_session().await;
        let user = tracker.current_identity().expect("signed in");
        let source = SignalEligibility::new(tracker.clone());

        source.install().await;
        assert!(!source.is_eligible().await);

        store.set(user, keys::ACTION, 1.0).await.expect("push");
        assert!(source.is_eligible().await);

        // Any value other than 1 means "not the right moment yet".
        store.set(user, keys::ACTION, 0.0).await.expect("push");
        assert!(!source.is_eligible().await);
    }

    #[tokio::test]
    async fn signal_install_and_teardown_are_idempotent() {
        let (tracker, store) = ready_session().await;
        let user = tracker.current_identity().expect("signed in");
        let source = SignalEligibility::new(tracker.clone());

        // Teardown before any install is a no-op.
        source.teardown();

        source.install().await;
        store.set(user, keys::ACTION, 1.0).await.expect("push");

        // A second install must not replace the live subscription.
        source.install().await;
        assert!(source.is_eligible().await);

        source.teardown();
        source.teardown();
        assert!(!source.is_eligible().await);
    }

    #[tokio::test]
    async fn signal_install_without_session_is_deferred() {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = SessionTracker::spawn(
            Arc::new(crate::auth::OfflineAuth::new()),
            store.clone(),
        );
        let source = SignalEligibility::new(tracker);

        source.install().await;
        assert!(!source.is_eligible().await);
    }
}
