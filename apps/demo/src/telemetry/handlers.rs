//! Handlers for the screen-open and button events the demo surface exposes.
//!
//! Telemetry never reports failure to the caller: whether or not the write
//! landed, the event endpoints acknowledge with 200.

use axum::extract::State;
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::keys;
use crate::state::AppState;

#[derive(Serialize)]
pub struct EventAck {
    pub status: &'static str,
}

fn ack() -> Json<EventAck> {
    Json(EventAck { status: "ok" })
}

/// POST /api/v1/screen/open
///
/// The screen was created: count the open and update (or locally seed) the
/// days-since-first-open figure.
pub async fn handle_screen_open(State(state): State<AppState>) -> Json<EventAck> {
    state.telemetry.record_app_open().await;
    state.telemetry.record_first_open_if_needed().await;
    ack()
}

/// POST /api/v1/events/function
pub async fn handle_function_event(State(state): State<AppState>) -> Json<EventAck> {
    state.telemetry.record_event(keys::COUNTER_FUNCTION).await;
    ack()
}

#[derive(Deserialize, Default)]
pub struct GameRequest {
    /// Score to record; rolled randomly when absent, like the original game.
    pub score: Option<u32>,
}

#[derive(Serialize)]
pub struct GameResponse {
    pub status: &'static str,
    pub score: u32,
}

/// POST /api/v1/events/game
pub async fn handle_game_event(
    State(state): State<AppState>,
    body: Option<Json<GameRequest>>,
) -> Result<Json<GameResponse>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let score = match req.score {
        Some(s) if s > 100 => {
            return Err(AppError::Validation(format!(
                "score {s} out of range (0..=100)"
            )))
        }
        Some(s) => s,
        None => rand::thread_rng().gen_range(0..100),
    };

    state.telemetry.record_event(keys::COUNTER_GAME).await;
    state
        .telemetry
        .record_score(keys::GAME_SCORE, f64::from(score))
        .await;

    Ok(Json(GameResponse {
        status: "ok",
        score,
    }))
}
