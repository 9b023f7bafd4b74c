pub mod api;
pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        .route("/health", get(health::health_handler))
        // HTML surface
        .route("/", get(ui::handle_index))
        .route("/scan", post(ui::handle_scan))
        .route("/resume-file/clear", post(ui::handle_clear_resume_file))
        .route("/reset", post(ui::handle_reset))
        .route("/theme", post(ui::handle_toggle_theme))
        // JSON API
        .route("/api/session", get(api::handle_get_session))
        .route("/api/session/inputs", put(api::handle_update_inputs))
        .route(
            "/api/session/attachment",
            post(api::handle_attach).delete(api::handle_detach),
        )
        .route("/api/session/scan", post(api::handle_scan))
        .route("/api/session/reset", post(api::handle_reset))
        .route("/api/session/theme", post(api::handle_toggle_theme))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
