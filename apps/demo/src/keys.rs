//! Counter, record, and preference key names shared by the whole service.
//!
//! The remote layout per authenticated user is:
//! `/{ROOT}/{user_id}/{key} -> number`, with `y_observed` written 0|1 once the
//! rating prompt has been resolved.

/// Root namespace for both the remote record tree and local preferences.
pub const ROOT: &str = "rating_popup";

// Usage counters (x_* = independent variables).
pub const COUNTER_APP_OPEN: &str = "x_app_open";
pub const DAYS_SINCE_FIRST_OPEN: &str = "x_days_since_first_open";
pub const COUNTER_FUNCTION: &str = "x_counter_function";
pub const COUNTER_GAME: &str = "x_counter_game";
pub const GAME_SCORE: &str = "x_last_game_score";

/// Whether the user accepted (1) or declined (0) the rating prompt.
/// Absent until the first resolution.
pub const OBSERVED: &str = "y_observed";

/// Per-user signal pushed from the backend in the subscription-based
/// eligibility variant. Value 1 means "prompt now".
pub const ACTION: &str = "action";

/// Remotely configured rollout flag gating the prompt.
pub const REMOTE_LABEL_DATA: &str = "label_data";

// Local preference keys.
pub const PREF_DID_RATING_POPUP: &str = "did_rating_popup";
pub const PREF_FIRST_OPEN: &str = "first_open";

pub const MILLIS_PER_DAY: i64 = 86_400_000;
