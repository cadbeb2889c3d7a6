use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

pub async fn health_check(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let notifier = state.notifier();
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "pendingEvents": state.events().len().await,
        "escalation": {
            "windowSecs": state.events().window_secs(),
            "threshold": state.events().threshold(),
            "cooldownSecs": notifier.cooldown_secs(),
        },
        "channels": {
            "sms": notifier.sms_enabled(),
            "email": notifier.email_enabled(),
        }
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

pub async fn readiness() -> StatusCode {
    StatusCode::OK
}
