//! Usage telemetry — per-user counters written to the remote record store.
//!
//! Every operation re-checks the availability guard and silently drops the
//! write when it fails; callers never learn whether a write happened. Remote
//! failures downstream of the guard are logged and swallowed.

pub mod handlers;

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::guard;
use crate::keys;
use crate::prefs::LocalPrefs;
use crate::session::SessionTracker;

pub struct UsageTelemetry {
    session: Arc<SessionTracker>,
    prefs: Arc<dyn LocalPrefs>,
}

impl UsageTelemetry {
    pub fn new(session: Arc<SessionTracker>, prefs: Arc<dyn LocalPrefs>) -> Self {
        Self { session, prefs }
    }

    /// One app open: increments `x_app_open`.
    pub async fn record_app_open(&self) {
        self.increment(keys::COUNTER_APP_OPEN).await;
    }

    /// First call ever persists the current instant locally and writes nothing
    /// remotely. Every later call overwrites `x_days_since_first_open`.
    pub async fn record_first_open_if_needed(&self) {
        self.record_first_open_at(Utc::now().timestamp_millis())
            .await;
    }

    async fn record_first_open_at(&self, now_ms: i64) {
        let first = self.prefs.get_long(keys::PREF_FIRST_OPEN, 0);
        if first == 0 {
            self.prefs.set_long(keys::PREF_FIRST_OPEN, now_ms);
            return;
        }
        let days = days_since_first_open(first, now_ms);
        self.overwrite(keys::DAYS_SINCE_FIRST_OPEN, days as f64)
            .await;
    }

    /// Read-modify-write increment of a named counter, absent reading as 0.
    pub async fn record_event(&self, key: &str) {
        self.increment(key).await;
    }

    /// Unconditional overwrite of a named counter (scores).
    pub async fn record_score(&self, key: &str, value: f64) {
        self.overwrite(key, value).await;
    }

    async fn increment(&self, key: &str) {
        if !guard::available(&self.session, self.prefs.as_ref()) {
            return;
        }
        let Some(handle) = self.session.record_handle() else {
            return;
        };
        // Plain read-then-write, not a transaction: each counter is only ever
        // touched from one client context at a time.
        match handle.get(key).await {
            Ok(previous) => {
                let next = previous.unwrap_or(0.0) + 1.0;
                if let Err(e) = handle.set(key, next).await {
                    debug!("counter write dropped for {key}: {e}");
                }
            }
            Err(e) => debug!("counter read dropped for {key}: {e}"),
        }
    }

    async fn overwrite(&self, key: &str, value: f64) {
        if !guard::available(&self.session, self.prefs.as_ref()) {
            return;
        }
        let Some(handle) = self.session.record_handle() else {
            return;
        };
        if let Err(e) = handle.set(key, value).await {
            debug!("value write dropped for {key}: {e}");
        }
    }
}

/// Whole days elapsed since the first open, rounded to nearest, plus one.
/// Same-day use therefore reads as day 1, the next day as day 2.
pub fn days_since_first_open(first_ms: i64, now_ms: i64) -> i64 {
    ((now_ms - first_ms) as f64 / keys::MILLIS_PER_DAY as f64).round() as i64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AnonymousAuth, OfflineAuth};
    use crate::prefs::MemoryPrefs;
    use crate::store::memory::MemoryRecordStore;
    use crate::store::RemoteRecordStore;

    async fn ready_fixture() -> (UsageTelemetry, Arc<MemoryRecordStore>, Arc<SessionTracker>) {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = SessionTracker::spawn(Arc::new(AnonymousAuth::new()), store.clone());
        tracker.ready().await;
        let prefs: Arc<dyn LocalPrefs> = Arc::new(MemoryPrefs::new());
        (
            UsageTelemetry::new(tracker.clone(), prefs),
            store,
            tracker,
        )
    }

    async fn counter(
        store: &MemoryRecordStore,
        tracker: &SessionTracker,
        key: &str,
    ) -> Option<f64> {
        let user = tracker.current_identity().expect("signed in");
        store.get(user, key).await.expect("memory read")
    }

    #[tokio::test]
    async fn serialized_events_count_up_from_absent() {
        let (telemetry, store, tracker) = ready_fixture().await;
        for _ in 0..3 {
            telemetry.record_event(keys::COUNTER_FUNCTION).await;
        }
        assert_eq!(
            counter(&store, &tracker, keys::COUNTER_FUNCTION).await,
            Some(3.0)
        );
    }

    #[tokio::test]
    async fn app_open_increments_its_own_counter() {
        let (telemetry, store, tracker) = ready_fixture().await;
        telemetry.record_app_open().await;
        telemetry.record_app_open().await;
        assert_eq!(
            counter(&store, &tracker, keys::COUNTER_APP_OPEN).await,
            Some(2.0)
        );
    }

    #[tokio::test]
    async fn score_overwrites_instead_of_incrementing() {
        let (telemetry, store, tracker) = ready_fixture().await;
        telemetry.record_score(keys::GAME_SCORE, 57.0).await;
        telemetry.record_score(keys::GAME_SCORE, 12.0).await;
        assert_eq!(
            counter(&store, &tracker, keys::GAME_SCORE).await,
            Some(12.0)
        );
    }

    #[tokio::test]
    async fn first_open_persists_locally_without_remote_write() {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = SessionTracker::spawn(Arc::new(AnonymousAuth::new()), store.clone());
        tracker.ready().await;
        let prefs = Arc::new(MemoryPrefs::new());
        let telemetry = UsageTelemetry::new(tracker.clone(), prefs.clone());

        telemetry.record_first_open_at(1_000).await;
        assert_eq!(prefs.get_long(keys::PREF_FIRST_OPEN, 0), 1_000);
        assert_eq!(
            counter(&store, &tracker, keys::DAYS_SINCE_FIRST_OPEN).await,
            None
        );
    }

    #[tokio::test]
    async fn second_open_writes_the_day_count() {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = SessionTracker::spawn(Arc::new(AnonymousAuth::new()), store.clone());
        tracker.ready().await;
        let prefs = Arc::new(MemoryPrefs::new());
        let telemetry = UsageTelemetry::new(tracker.clone(), prefs.clone());

        telemetry.record_first_open_at(1_000).await;

        // Exactly one day later.
        telemetry
            .record_first_open_at(1_000 + keys::MILLIS_PER_DAY)
            .await;
        assert_eq!(
            counter(&store, &tracker, keys::DAYS_SINCE_FIRST_OPEN).await,
            Some(2.0)
        );

        // Zero elapsed reads as day 1.
        telemetry.record_first_open_at(1_000).await;
        assert_eq!(
            counter(&store, &tracker, keys::DAYS_SINCE_FIRST_OPEN).await,
            Some(1.0)
        );
    }

    #[test]
    fn day_count_rounds_to_nearest() {
        assert_eq!(days_since_first_open(0, 0), 1);
        assert_eq!(days_since_first_open(0, keys::MILLIS_PER_DAY), 2);
        // Half a day rounds up (round-half-away-from-zero).
        assert_eq!(days_since_first_open(0, keys::MILLIS_PER_DAY / 2), 2);
        assert_eq!(days_since_first_open(0, keys::MILLIS_PER_DAY / 2 - 1), 1);
        assert_eq!(days_since_first_open(0, 10 * keys::MILLIS_PER_DAY), 11);
    }

    #[tokio::test]
    async fn writes_drop_silently_while_signed_out() {
        let store = Arc::new(MemoryRecordStore::new());
        let auth = Arc::new(OfflineAuth::new());
        let tracker = SessionTracker::spawn(auth.clone(), store.clone());
        let prefs: Arc<dyn LocalPrefs> = Arc::new(MemoryPrefs::new());
        let telemetry = UsageTelemetry::new(tracker.clone(), prefs);

        telemetry.record_app_open().await;
        telemetry.record_score(keys::GAME_SCORE, 99.0).await;

        // Nothing was written anywhere, and nothing panicked.
        assert!(tracker.record_handle().is_none());

        // Once auth comes online the same calls start landing.
        auth.come_online();
        tracker.ready().await;
        telemetry.record_app_open().await;
        assert_eq!(
            counter(&store, &tracker, keys::COUNTER_APP_OPEN).await,
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn latch_disables_all_writes_permanently() {
        let (telemetry, store, tracker) = ready_fixture().await;
        telemetry.record_event(keys::COUNTER_GAME).await;

        telemetry
            .prefs
            .set_bool(keys::PREF_DID_RATING_POPUP, true);
        telemetry.record_event(keys::COUNTER_GAME).await;
        telemetry.record_score(keys::GAME_SCORE, 5.0).await;

        assert_eq!(
            counter(&store, &tracker, keys::COUNTER_GAME).await,
            Some(1.0)
        );
        assert_eq!(counter(&store, &tracker, keys::GAME_SCORE).await, None);
    }
}
