mod auth;
mod config;
mod errors;
mod flags;
mod guard;
mod keys;
mod prefs;
mod rating;
mod routes;
mod session;
mod state;
mod store;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::AnonymousAuth;
use crate::config::{Config, EligibilityVariant};
use crate::flags::{default_flags, HttpFlagSource, RemoteFlagSource, StaticFlagSource};
use crate::prefs::{FilePrefs, LocalPrefs};
use crate::rating::eligibility::{EligibilitySource, FlagEligibility, SignalEligibility};
use crate::rating::prompt::LogPrompter;
use crate::rating::RatingPolicy;
use crate::routes::build_router;
use crate::session::SessionTracker;
use crate::state::AppState;
use crate::store::http::HttpRecordStore;
use crate::store::memory::MemoryRecordStore;
use crate::store::RemoteRecordStore;
use crate::telemetry::UsageTelemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rating demo service v{}", env!("CARGO_PKG_VERSION"));

    // Record store: HTTP when configured, otherwise in-process
    let store: Arc<dyn RemoteRecordStore> = match &config.store_url {
        Some(url) => {
            info!("Record store: {url}");
            Arc::new(HttpRecordStore::new(
                url.clone(),
                keys::ROOT.to_string(),
                Duration::from_millis(config.store_poll_interval_ms),
            ))
        }
        None => {
            info!("No STORE_URL set, using the in-memory record store");
            Arc::new(MemoryRecordStore::new())
        }
    };

    // Remote config: defaults apply until the first successful fetch
    let flags: Arc<dyn RemoteFlagSource> = match &config.remote_config_url {
        Some(url) => {
            info!("Remote config: {url}");
            Arc::new(HttpFlagSource::new(
                url.clone(),
                default_flags(),
                Duration::from_secs(config.flag_cache_ttl_secs),
            ))
        }
        None => {
            info!("No REMOTE_CONFIG_URL set, serving hardcoded flag defaults");
            Arc::new(StaticFlagSource::new(default_flags()))
        }
    };

    // Fire-and-forget startup fetch; failure leaves the defaults in force
    let startup_flags = flags.clone();
    tokio::spawn(async move {
        if let Err(e) = startup_flags.fetch_and_activate().await {
            warn!("startup remote config fetch failed: {e}");
        }
    });

    // Anonymous auth; the tracker signs in and scopes the record handle
    let auth = Arc::new(AnonymousAuth::new());
    let session = SessionTracker::spawn(auth, store);
    info!("Session tracker started");

    // Local preferences (the rating latch and the first-open instant)
    let prefs: Arc<dyn LocalPrefs> = Arc::new(FilePrefs::open(&config.prefs_path));

    let telemetry = Arc::new(UsageTelemetry::new(session.clone(), prefs.clone()));

    let eligibility: Arc<dyn EligibilitySource> = match config.eligibility {
        EligibilityVariant::Flag => Arc::new(FlagEligibility::new(flags.clone())),
        EligibilityVariant::Signal => Arc::new(SignalEligibility::new(session.clone())),
    };
    info!("Eligibility source: {:?}", config.eligibility);

    let policy = RatingPolicy::new(
        session.clone(),
        prefs.clone(),
        eligibility,
        Arc::new(LogPrompter),
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        session,
        telemetry,
        policy: Arc::new(Mutex::new(policy)),
        flags,
        prefs,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
