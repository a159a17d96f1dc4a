use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Which eligibility mechanism drives the rating prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityVariant {
    /// Poll-once evaluation of the remote `label_data` flag (default).
    Flag,
    /// Standing subscription to the per-user `action` record.
    Signal,
}

/// Application configuration loaded from environment variables.
/// Every variable is optional; the defaults run a fully in-process demo.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base URL of the HTTP record store. Absent means in-memory.
    pub store_url: Option<String>,
    /// URL of the remote flag JSON. Absent means hardcoded defaults only.
    pub remote_config_url: Option<String>,
    pub flag_cache_ttl_secs: u64,
    pub store_poll_interval_ms: u64,
    pub prefs_path: PathBuf,
    pub eligibility: EligibilityVariant,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let eligibility = match optional_env("ELIGIBILITY_SOURCE").as_deref() {
            None | Some("flag") => EligibilityVariant::Flag,
            Some("signal") => EligibilityVariant::Signal,
            Some(other) => bail!("ELIGIBILITY_SOURCE must be 'flag' or 'signal', got '{other}'"),
        };

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            store_url: optional_env("STORE_URL"),
            remote_config_url: optional_env("REMOTE_CONFIG_URL"),
            flag_cache_ttl_secs: std::env::var("FLAG_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse::<u64>()
                .context("FLAG_CACHE_TTL_SECS must be a number of seconds")?,
            store_poll_interval_ms: std::env::var("STORE_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse::<u64>()
                .context("STORE_POLL_INTERVAL_MS must be a number of milliseconds")?,
            prefs_path: optional_env("PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("rating_popup_prefs.json")),
            eligibility,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
