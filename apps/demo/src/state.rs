use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::flags::RemoteFlagSource;
use crate::prefs::LocalPrefs;
use crate::rating::RatingPolicy;
use crate::session::SessionTracker;
use crate::telemetry::UsageTelemetry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionTracker>,
    pub telemetry: Arc<UsageTelemetry>,
    /// The policy mutates on lifecycle signals, so it lives behind a lock; the
    /// lock also serializes prompt resolution against concurrent signals.
    pub policy: Arc<Mutex<RatingPolicy>>,
    pub flags: Arc<dyn RemoteFlagSource>,
    pub prefs: Arc<dyn LocalPrefs>,
}
