//! HTTP record store — Firebase-REST-style JSON document tree.
//!
//! Layout: `{base_url}/{root}/{user_id}/{key}.json`, where a GET returns the
//! stored number or `null`. Standing subscriptions are poll-based: a
//! background task re-reads the key on an interval and publishes changes on a
//! watch channel until the handle is canceled.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::watch;
use tracing::debug;

use super::{RemoteRecordStore, StoreError, Subscription};
use crate::auth::UserId;

pub struct HttpRecordStore {
    client: Client,
    base_url: String,
    root: String,
    poll_interval: Duration,
}

impl HttpRecordStore {
    pub fn new(base_url: String, root: String, poll_interval: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            root,
            poll_interval,
        }
    }

    fn key_url(&self, user: UserId, key: &str) -> String {
        format!("{}/{}/{}/{}.json", self.base_url, self.root, user, key)
    }

    async fn read(&self, url: &str) -> Result<Option<f64>, StoreError> {
        let value: serde_json::Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| StoreError::Payload(format!("non-finite number: {n}"))),
            other => Err(StoreError::Payload(format!(
                "expected number or null, got {other}"
            ))),
        }
    }
}

#[async_trait]
impl RemoteRecordStore for HttpRecordStore {
    async fn get(&self, user: UserId, key: &str) -> Result<Option<f64>, StoreError> {
        self.read(&self.key_url(user, key)).await
    }

    async fn set(&self, user: UserId, key: &str, value: f64) -> Result<(), StoreError> {
        self.client
            .put(self.key_url(user, key))
            .json(&value)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn subscribe(&self, user: UserId, key: &str) -> Subscription {
        let (tx, rx) = watch::channel(None);
        let client = self.client.clone();
        let url = self.key_url(user, key);
        let interval = self.poll_interval;

        let poller = tokio::spawn(async move {
            loop {
                let read = async {
                    let value: serde_json::Value = client
                        .get(&url)
                        .send()
                        .await?
                        .error_for_status()?
                        .json()
                        .await?;
                    Ok::<_, reqwest::Error>(value.as_f64())
                };
                match read.await {
                    Ok(value) => {
                        tx.send_if_modified(|current| {
                            if *current == value {
                                false
                            } else {
                                *current = value;
                                true
                            }
                        });
                    }
                    // Offline or access not allowed: drop this poll, keep going.
                    Err(e) => debug!("record poll dropped for {url}: {e}"),
                }
                tokio::time::sleep(interval).await;
            }
        });

        Subscription::new(rx, Some(poller))
    }
}
