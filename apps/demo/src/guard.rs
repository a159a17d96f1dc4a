//! The availability guard gating every remote write.

use crate::keys;
use crate::prefs::LocalPrefs;
use crate::session::SessionTracker;

/// True when remote writes may proceed: an identity is present, a record
/// handle is scoped to it, and this install has not completed the rating flow.
///
/// Re-evaluated on every call; never cached. When false, callers drop their
/// operation silently instead of waiting.
pub fn available(session: &SessionTracker, prefs: &dyn LocalPrefs) -> bool {
    session.current_identity().is_some()
        && session.record_handle().is_some()
        && !prefs.get_bool(keys::PREF_DID_RATING_POPUP, false)
}
