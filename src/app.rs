use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:id", axum::routing::delete(handlers::delete_session))
        .route("/api/sessions/:id/click", post(handlers::click))
        .route("/api/sessions/:id/clear", post(handlers::clear))
        .route("/api/sessions/:id/stats", get(handlers::get_stats))
        .route("/api/sessions/:id/histogram", get(handlers::get_histogram))
        .route("/api/sessions/:id/peak", get(handlers::get_peak))
        .route("/api/sessions/:id/history", get(handlers::get_history))
        .route("/api/sessions/:id/export", get(handlers::export))
        .with_state(state)
}
