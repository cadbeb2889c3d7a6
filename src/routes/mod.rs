pub mod events;
pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::middleware::request_id;
use crate::response::AppError;
use crate::state::AppState;

/// Event reports are tiny; anything larger is a client bug.
const MAX_BODY_SIZE: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(events::router())
        .nest("/health", health::router())
        .fallback(fallback_404)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}

async fn fallback_404() -> AppError {
    AppError::not_found("Not found")
}
