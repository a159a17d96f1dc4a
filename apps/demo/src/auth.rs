//! Anonymous authentication — the identity provider behind the availability
//! guard.
//!
//! The session is established asynchronously after startup; consumers observe
//! sign-in/sign-out through a watch channel rather than callbacks.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// Opaque authenticated-user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Mints a fresh anonymous identity.
    pub fn new_anonymous() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The identity provider the core depends on.
///
/// `sign_in_anonymously` is invoked (by the session tracker) exactly once each
/// time the identity becomes absent.
#[async_trait]
pub trait AuthSession: Send + Sync {
    fn current_identity(&self) -> Option<UserId>;
    /// Change notifications. The receiver's current value is the identity now.
    fn changes(&self) -> watch::Receiver<Option<UserId>>;
    async fn sign_in_anonymously(&self);
}

/// Default provider: mints a v4 identity on demand. Starts signed out.
pub struct AnonymousAuth {
    identity: watch::Sender<Option<UserId>>,
}

impl AnonymousAuth {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { identity: tx }
    }

    /// Drops the current identity. The session tracker reacts by signing in
    /// again, so this effectively rotates the anonymous user.
    #[allow(dead_code)]
    pub fn sign_out(&self) {
        self.identity.send_replace(None);
    }
}

impl Default for AnonymousAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthSession for AnonymousAuth {
    fn current_identity(&self) -> Option<UserId> {
        *self.identity.borrow()
    }

    fn changes(&self) -> watch::Receiver<Option<UserId>> {
        self.identity.subscribe()
    }

    async fn sign_in_anonymously(&self) {
        let uid = UserId::new_anonymous();
        info!("auth state changed: signed_in:{uid}");
        self.identity.send_replace(Some(uid));
    }
}

/// Auth double for offline scenarios: sign-in requests go nowhere, so the
/// session never becomes ready.
#[cfg(test)]
pub(crate) struct OfflineAuth {
    identity: watch::Sender<Option<UserId>>,
}

#[cfg(test)]
impl OfflineAuth {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { identity: tx }
    }

    /// Simulates connectivity coming back: the pending sign-in completes.
    pub(crate) fn come_online(&self) {
        self.identity.send_replace(Some(UserId::new_anonymous()));
    }
}

#[cfg(test)]
#[async_trait]
impl AuthSession for OfflineAuth {
    fn current_identity(&self) -> Option<UserId> {
        *self.identity.borrow()
    }

    fn changes(&self) -> watch::Receiver<Option<UserId>> {
        self.identity.subscribe()
    }

    async fn sign_in_anonymously(&self) {
        // Offline: the request is dropped.
    }
}
