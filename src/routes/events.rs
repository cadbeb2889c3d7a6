use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use drowsiness_core::EventKind;
use serde::{Deserialize, Serialize};

use crate::extractors::JsonBody;
use crate::services::event_window::EventRecord;
use crate::services::notifier::NotificationOutcome;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update", post(update))
        .route("/events", get(list_events))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub drowsy: bool,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl UpdateRequest {
    fn event_kind(&self) -> EventKind {
        match self.kind.as_deref() {
            Some(raw) => EventKind::parse(raw),
            None if self.drowsy => EventKind::Drowsiness,
            None => EventKind::Unknown,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub ok: bool,
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<NotificationOutcome>,
}

/// Records one detection event and escalates once the window fills up.
pub async fn update(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UpdateRequest>,
) -> Json<UpdateResponse> {
    let kind = req.event_kind();
    if kind == EventKind::Unknown {
        tracing::warn!(raw_type = ?req.kind, drowsy = req.drowsy, "Event with unrecognized type");
    }

    let decision = state.events().ingest(EventRecord::now(kind)).await;
    tracing::debug!(%kind, count = decision.count, "Event recorded");

    if !decision.escalate {
        return Json(UpdateResponse {
            ok: true,
            notified: false,
            current_count: Some(decision.count),
            result: None,
        });
    }

    tracing::warn!(
        count = decision.count,
        window_secs = state.events().window_secs(),
        "Escalation threshold reached"
    );
    let outcome = state.notifier().notify(kind, Some(decision.count)).await;

    Json(UpdateResponse {
        ok: true,
        notified: true,
        current_count: None,
        result: Some(outcome),
    })
}

pub async fn list_events(State(state): State<AppState>) -> Json<Vec<EventRecord>> {
    Json(state.events().snapshot().await)
}
