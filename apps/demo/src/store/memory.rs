//! In-process record store. Default backend when no STORE_URL is configured,
//! and the double every core test runs against.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{RemoteRecordStore, StoreError, Subscription};
use crate::auth::UserId;

type RecordKey = (UserId, String);

#[derive(Default)]
struct Inner {
    values: HashMap<RecordKey, f64>,
    /// One watch sender per subscribed key; kept alive here so late writes
    /// still reach standing subscriptions.
    subs: HashMap<RecordKey, watch::Sender<Option<f64>>>,
}

#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteRecordStore for MemoryRecordStore {
    async fn get(&self, user: UserId, key: &str) -> Result<Option<f64>, StoreError> {
        let inner = self.inner.lock().expect("record store lock poisoned");
        Ok(inner.values.get(&(user, key.to_string())).copied())
    }

    async fn set(&self, user: UserId, key: &str, value: f64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("record store lock poisoned");
        let record_key = (user, key.to_string());
        inner.values.insert(record_key.clone(), value);
        if let Some(tx) = inner.subs.get(&record_key) {
            tx.send_replace(Some(value));
        }
        Ok(())
    }

    fn subscribe(&self, user: UserId, key: &str) -> Subscription {
        let mut inner = self.inner.lock().expect("record store lock poisoned");
        let record_key = (user, key.to_string());
        let current = inner.values.get(&record_key).copied();
        let tx = inner
            .subs
            .entry(record_key)
            .or_insert_with(|| watch::channel(None).0);
        tx.send_replace(current);
        Subscription::new(tx.subscribe(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_key_reads_none() {
        let store = MemoryRecordStore::new();
        let user = UserId::new_anonymous();
        assert_eq!(store.get(user, "x_app_open").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = MemoryRecordStore::new();
        let user = UserId::new_anonymous();
        store.set(user, "x_last_game_score", 42.0).await.unwrap();
        assert_eq!(
            store.get(user, "x_last_game_score").await.unwrap(),
            Some(42.0)
        );
    }

    #[tokio::test]
    async fn records_are_scoped_per_user() {
        let store = MemoryRecordStore::new();
        let a = UserId::new_anonymous();
        let b = UserId::new_anonymous();
        store.set(a, "x_app_open", 3.0).await.unwrap();
        assert_eq!(store.get(b, "x_app_open").await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscription_sees_current_value_and_updates() {
        let store = MemoryRecordStore::new();
        let user = UserId::new_anonymous();
        store.set(user, "action", 0.0).await.unwrap();

        let mut sub = store.subscribe(user, "action");
        assert_eq!(sub.current(), Some(0.0));

        store.set(user, "action", 1.0).await.unwrap();
        assert!(sub.changed().await);
        assert_eq!(sub.current(), Some(1.0));
    }

    #[tokio::test]
    async fn subscription_to_absent_key_starts_none() {
        let store = MemoryRecordStore::new();
        let user = UserId::new_anonymous();
        let sub = store.subscribe(user, "action");
        assert_eq!(sub.current(), None);
        sub.cancel();
    }
}
