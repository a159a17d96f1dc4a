//! Remote per-user record store — the durable home of the usage counters.
//!
//! Two backends: `HttpRecordStore` talks to a Firebase-REST-style JSON
//! endpoint; `MemoryRecordStore` is the in-process default (no STORE_URL set)
//! and the test double. Records are upserted on first write; nothing here
//! ever deletes them.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::UserId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected payload: {0}")]
    Payload(String),
}

/// The record store the core consumes. All values are JSON numbers.
#[async_trait]
pub trait RemoteRecordStore: Send + Sync {
    /// Single read of one record key. Absent keys read as `None`.
    async fn get(&self, user: UserId, key: &str) -> Result<Option<f64>, StoreError>;

    /// Overwrites one record key, creating the record if needed.
    async fn set(&self, user: UserId, key: &str, value: f64) -> Result<(), StoreError>;

    /// Standing subscription to one record key.
    fn subscribe(&self, user: UserId, key: &str) -> Subscription;
}

/// Cancelable handle to a standing record subscription.
///
/// The current value is always readable; change notification rides on a watch
/// channel. Dropping the handle cancels the subscription.
pub struct Subscription {
    rx: watch::Receiver<Option<f64>>,
    poller: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(rx: watch::Receiver<Option<f64>>, poller: Option<JoinHandle<()>>) -> Self {
        Self { rx, poller }
    }

    /// Latest observed value for the subscribed key.
    pub fn current(&self) -> Option<f64> {
        *self.rx.borrow()
    }

    /// Waits for the next value change. Returns `false` if the backing store
    /// is gone.
    #[allow(dead_code)]
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Tears the subscription down. Dropping the handle has the same effect.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}
