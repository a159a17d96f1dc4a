//! Handlers for the screen lifecycle and the rating prompt itself.
//!
//! Over HTTP the "modal" rides on the response body: a resume that lands in
//! `Presenting` carries the prompt text, and the client answers through the
//! rating response endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::UserId;
use crate::errors::AppError;
use crate::guard;
use crate::keys;
use crate::state::AppState;

use super::prompt::{PROMPT_MESSAGE, STORE_MESSAGE};
use super::{PolicyState, PromptResponse};

#[derive(Serialize)]
pub struct ScreenResponse {
    pub state: PolicyState,
    /// Present exactly when the policy just moved to (or stays in) `Presenting`.
    pub prompt: Option<String>,
}

/// POST /api/v1/screen/resume — the lifecycle signal.
pub async fn handle_screen_resume(State(state): State<AppState>) -> Json<ScreenResponse> {
    let mut policy = state.policy.lock().await;
    let new_state = policy.on_screen_active().await;
    Json(ScreenResponse {
        state: new_state,
        prompt: (new_state == PolicyState::Presenting).then(|| PROMPT_MESSAGE.to_string()),
    })
}

/// POST /api/v1/screen/pause — tears down any standing eligibility
/// subscription, mirroring the screen being hidden.
pub async fn handle_screen_pause(State(state): State<AppState>) -> Json<ScreenResponse> {
    let mut policy = state.policy.lock().await;
    policy.on_screen_hidden();
    Json(ScreenResponse {
        state: policy.state(),
        prompt: None,
    })
}

#[derive(Deserialize)]
pub struct RatingAnswer {
    pub response: PromptResponse,
}

#[derive(Serialize)]
pub struct RatingResolution {
    pub state: PolicyState,
    /// False when no prompt was up, in which case the answer was ignored.
    pub applied: bool,
    pub message: Option<String>,
}

/// POST /api/v1/rating/response
pub async fn handle_rating_response(
    State(state): State<AppState>,
    Json(answer): Json<RatingAnswer>,
) -> Json<RatingResolution> {
    let mut policy = state.policy.lock().await;
    let applied = policy.state() == PolicyState::Presenting;
    let new_state = policy.resolve(answer.response).await;
    let message = (applied && answer.response == PromptResponse::Accept)
        .then(|| STORE_MESSAGE.to_string());
    Json(RatingResolution {
        state: new_state,
        applied,
        message,
    })
}

#[derive(Serialize)]
pub struct RatingStateResponse {
    pub state: PolicyState,
    pub available: bool,
    pub label_data: bool,
    pub user_id: Option<UserId>,
}

/// GET /api/v1/rating/state — debug snapshot of the policy and its guard.
pub async fn handle_rating_state(State(state): State<AppState>) -> Json<RatingStateResponse> {
    let policy = state.policy.lock().await;
    Json(RatingStateResponse {
        state: policy.state(),
        available: guard::available(&state.session, state.prefs.as_ref()),
        label_data: state.flags.get_bool(keys::REMOTE_LABEL_DATA),
        user_id: state.session.current_identity(),
    })
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
}

/// POST /api/v1/config/refresh — re-fetches the remote flag map. The one
/// endpoint that surfaces a remote failure, since the caller asked for it.
pub async fn handle_config_refresh(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    state.flags.fetch_and_activate().await?;
    Ok(Json(RefreshResponse { status: "ok" }))
}
