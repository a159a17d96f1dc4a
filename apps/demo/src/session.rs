//! Session tracking — ties the auth identity to a record handle.
//!
//! A background task follows auth state changes: on sign-in it scopes a
//! `RecordHandle` to the new identity; on sign-out it clears the handle and
//! requests a fresh anonymous sign-in. Until the handle exists, every
//! telemetry and prompt write is silently dropped by the availability guard.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::auth::{AuthSession, UserId};
use crate::store::{RemoteRecordStore, StoreError, Subscription};

/// Record-store access scoped to one authenticated identity.
#[derive(Clone)]
pub struct RecordHandle {
    user_id: UserId,
    store: Arc<dyn RemoteRecordStore>,
}

impl RecordHandle {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub async fn get(&self, key: &str) -> Result<Option<f64>, StoreError> {
        self.store.get(self.user_id, key).await
    }

    pub async fn set(&self, key: &str, value: f64) -> Result<(), StoreError> {
        self.store.set(self.user_id, key, value).await
    }

    pub fn subscribe(&self, key: &str) -> Subscription {
        self.store.subscribe(self.user_id, key)
    }
}

/// Owns the auth change subscription and the current record handle.
pub struct SessionTracker {
    auth: Arc<dyn AuthSession>,
    handle: watch::Sender<Option<RecordHandle>>,
}

impl SessionTracker {
    /// Starts tracking. If the session is signed out (the usual state at
    /// startup), an anonymous sign-in is requested immediately and again on
    /// every later sign-out.
    pub fn spawn(auth: Arc<dyn AuthSession>, store: Arc<dyn RemoteRecordStore>) -> Arc<Self> {
        let (tx, _rx) = watch::channel(None);
        let tracker = Arc::new(Self {
            auth: auth.clone(),
            handle: tx,
        });

        let mut changes = auth.changes();
        let this = tracker.clone();
        tokio::spawn(async move {
            loop {
                let identity = *changes.borrow_and_update();
                match identity {
                    Some(user_id) => {
                        debug!("session ready for {user_id}");
                        this.handle.send_replace(Some(RecordHandle {
                            user_id,
                            store: store.clone(),
                        }));
                    }
                    None => {
                        debug!("session signed out, requesting anonymous sign-in");
                        this.handle.send_replace(None);
                        auth.sign_in_anonymously().await;
                    }
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });

        tracker
    }

    pub fn current_identity(&self) -> Option<UserId> {
        self.auth.current_identity()
    }

    /// The record handle for the signed-in identity, if the session is up.
    pub fn record_handle(&self) -> Option<RecordHandle> {
        self.handle.borrow().clone()
    }

    /// Waits until a record handle exists. Demo and test convenience; the
    /// core never blocks on this.
    pub async fn ready(&self) {
        let mut rx = self.handle.subscribe();
        while rx.borrow_and_update().is_none() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AnonymousAuth;
    use crate::store::memory::MemoryRecordStore;

    #[tokio::test]
    async fn tracker_signs_in_and_scopes_a_handle() {
        let auth = Arc::new(AnonymousAuth::new());
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = SessionTracker::spawn(auth.clone(), store);

        tracker.ready().await;
        let handle = tracker.record_handle().expect("handle after sign-in");
        assert_eq!(Some(handle.user_id()), auth.current_identity());
    }

    #[tokio::test]
    async fn sign_out_clears_handle_and_rotates_identity() {
        let auth = Arc::new(AnonymousAuth::new());
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = SessionTracker::spawn(auth.clone(), store);

        tracker.ready().await;
        let first = tracker.record_handle().map(|h| h.user_id());
        assert!(first.is_some());

        auth.sign_out();
        // The tracker reacts asynchronously by requesting a fresh anonymous
        // identity; poll until the rotated handle lands.
        let second = tokio::time::timeout(std::time::Duration::from_secs(1), async {
            loop {
                if let Some(handle) = tracker.record_handle() {
                    if Some(handle.user_id()) != first {
                        return handle.user_id();
                    }
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("tracker rotated the identity");

        assert_ne!(first, Some(second));
    }

    #[tokio::test]
    async fn handle_reads_and_writes_through_the_store() {
        let auth = Arc::new(AnonymousAuth::new());
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = SessionTracker::spawn(auth, store);

        tracker.ready().await;
        let handle = tracker.record_handle().expect("handle");
        handle.set("x_app_open", 7.0).await.expect("write");
        assert_eq!(handle.get("x_app_open").await.expect("read"), Some(7.0));
    }
}
