pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::rating::handlers as rating_handlers;
use crate::state::AppState;
use crate::telemetry::handlers as telemetry_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screen lifecycle
        .route(
            "/api/v1/screen/open",
            post(telemetry_handlers::handle_screen_open),
        )
        .route(
            "/api/v1/screen/resume",
            post(rating_handlers::handle_screen_resume),
        )
        .route(
            "/api/v1/screen/pause",
            post(rating_handlers::handle_screen_pause),
        )
        // Usage events
        .route(
            "/api/v1/events/function",
            post(telemetry_handlers::handle_function_event),
        )
        .route(
            "/api/v1/events/game",
            post(telemetry_handlers::handle_game_event),
        )
        // Rating prompt
        .route(
            "/api/v1/rating/response",
            post(rating_handlers::handle_rating_response),
        )
        .route(
            "/api/v1/rating/state",
            get(rating_handlers::handle_rating_state),
        )
        // Remote config
        .route(
            "/api/v1/config/refresh",
            post(rating_handlers::handle_config_refresh),
        )
        .with_state(state)
}
