//! Remote feature flags — the rollout toggle gating the rating prompt.
//!
//! `get_bool` serves hardcoded defaults until a fetch-and-activate round trip
//! has completed; offline the defaults stand forever, which keeps the prompt
//! off (`label_data` defaults to false).

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::keys;

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait RemoteFlagSource: Send + Sync {
    /// Fetches the remote flag map and makes it authoritative. A fetch within
    /// the cache TTL of the previous successful one is a no-op.
    async fn fetch_and_activate(&self) -> Result<(), FlagError>;

    /// Current flag value; the default until the first successful activation.
    fn get_bool(&self, key: &str) -> bool;
}

/// The hardcoded flag defaults the service ships with.
pub fn default_flags() -> HashMap<String, bool> {
    HashMap::from([(keys::REMOTE_LABEL_DATA.to_string(), false)])
}

struct Activated {
    values: HashMap<String, bool>,
    fetched_at: Instant,
}

/// Flag source backed by a JSON endpoint returning `{ "key": bool, ... }`.
pub struct HttpFlagSource {
    client: Client,
    url: String,
    defaults: HashMap<String, bool>,
    cache_ttl: Duration,
    activated: RwLock<Option<Activated>>,
}

impl HttpFlagSource {
    pub fn new(url: String, defaults: HashMap<String, bool>, cache_ttl: Duration) -> Self {
        Self {
            client: Client::new(),
            url,
            defaults,
            cache_ttl,
            activated: RwLock::new(None),
        }
    }
}

#[async_trait]
impl RemoteFlagSource for HttpFlagSource {
    async fn fetch_and_activate(&self) -> Result<(), FlagError> {
        {
            let activated = self.activated.read().expect("flag lock poisoned");
            if let Some(a) = activated.as_ref() {
                if a.fetched_at.elapsed() < self.cache_ttl {
                    debug!("remote config fetch skipped, cached copy still fresh");
                    return Ok(());
                }
            }
        }

        let values: HashMap<String, bool> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("remote config activated ({} flags)", values.len());
        let mut activated = self.activated.write().expect("flag lock poisoned");
        *activated = Some(Activated {
            values,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    fn get_bool(&self, key: &str) -> bool {
        let activated = self.activated.read().expect("flag lock poisoned");
        activated
            .as_ref()
            .and_then(|a| a.values.get(key))
            .or_else(|| self.defaults.get(key))
            .copied()
            .unwrap_or(false)
    }
}

/// Fixed flag map; used when no remote config endpoint is configured, and as
/// the flippable double in tests.
pub struct StaticFlagSource {
    values: RwLock<HashMap<String, bool>>,
}

impl StaticFlagSource {
    pub fn new(values: HashMap<String, bool>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    #[allow(dead_code)]
    pub fn set(&self, key: &str, value: bool) {
        self.values
            .write()
            .expect("flag lock poisoned")
            .insert(key.to_string(), value);
    }
}

#[async_trait]
impl RemoteFlagSource for StaticFlagSource {
    async fn fetch_and_activate(&self) -> Result<(), FlagError> {
        Ok(())
    }

    fn get_bool(&self, key: &str) -> bool {
        self.values
            .read()
            .expect("flag lock poisoned")
            .get(key)
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_data_defaults_to_false() {
        assert_eq!(default_flags().get(keys::REMOTE_LABEL_DATA), Some(&false));
    }

    #[test]
    fn http_source_serves_defaults_before_activation() {
        let source = HttpFlagSource::new(
            "http://localhost:0/config.json".to_string(),
            default_flags(),
            Duration::from_secs(0),
        );
        assert!(!source.get_bool(keys::REMOTE_LABEL_DATA));
        assert!(!source.get_bool("unknown_flag"));
    }

    #[tokio::test]
    async fn static_source_flips() {
        let source = StaticFlagSource::new(default_flags());
        assert!(!source.get_bool(keys::REMOTE_LABEL_DATA));
        source.set(keys::REMOTE_LABEL_DATA, true);
        assert!(source.get_bool(keys::REMOTE_LABEL_DATA));
        assert!(source.fetch_and_activate().await.is_ok());
    }
}
