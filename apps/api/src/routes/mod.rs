pub mod health;

use axum::{
    routing::{get, put},
    Router,
};

use crate::explore::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/explore/liked-you",
            get(handlers::handle_list_liked_you),
        )
        .route(
            "/api/v1/explore/liked-you/new",
            get(handlers::handle_list_new_liked_you),
        )
        .route(
            "/api/v1/explore/liked-you/count",
            get(handlers::handle_count_liked_you),
        )
        .route(
            "/api/v1/explore/decisions",
            put(handlers::handle_put_decision),
        )
        .with_state(state)
}
