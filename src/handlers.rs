//! HTTP route handlers for the demo server.
//!
//! The page shows whatever the list last rendered. The API simulates other
//! collaborators (join, leave, metadata changes) and forwards widget
//! interactions to the list's event loop.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::models::{UiEvent, User};
use crate::presence::PresenceCache;
use crate::templates::base_html;
use crate::AppState;

// ============================================================================
// Page
// ============================================================================

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let list_html = state.surface.to_html().unwrap_or_default();
    Html(base_html(&state.room, &list_html))
}

// ============================================================================
// Presence API
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub id: String,
}

/// GET /api/users - Everyone currently present.
pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(state.presence.get_all())
}

/// POST /api/join - Add (or replace) a collaborator.
pub async fn join(State(state): State<Arc<AppState>>, Json(req): Json<JoinRequest>) -> Response {
    let id = req.id.trim();
    if id.is_empty() {
        return (StatusCode::BAD_REQUEST, "id is required").into_response();
    }

    let mut user = User::new(id);
    user.display_name = req.display_name.filter(|n| !n.is_empty());
    user.avatar_url = req.avatar_url.filter(|u| !u.is_empty());
    state.presence.join(user.clone());

    (StatusCode::CREATED, Json(user)).into_response()
}

/// POST /api/leave - Remove a collaborator.
pub async fn leave(State(state): State<Arc<AppState>>, Json(req): Json<LeaveRequest>) -> Response {
    match state.presence.leave(&req.id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => (StatusCode::NOT_FOUND, "User not found").into_response(),
    }
}

/// POST /api/users/{id}/{field} - Change one metadata field, as if another
/// client had written it.
pub async fn set_field(
    State(state): State<Arc<AppState>>,
    Path((id, field)): Path<(String, String)>,
    Json(value): Json<Value>,
) -> Response {
    match state.presence.set_field(&id, &field, value) {
        Ok(user) => Json(user).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

// ============================================================================
// Widget API
// ============================================================================

/// POST /api/ui - Forward a widget interaction to the list.
pub async fn ui_event(State(state): State<Arc<AppState>>, Json(event): Json<UiEvent>) -> Response {
    debug!(?event, "ui event");
    match state.ui_tx.send(event) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "User list is not running").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PresenceEvent;
    use crate::presence::{Delivery, LocalPresence};
    use crate::surface::MemorySurface;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn state() -> (Arc<AppState>, mpsc::UnboundedReceiver<UiEvent>) {
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let state = AppState {
            room: "lobby".to_string(),
            presence: LocalPresence::new(User::new("me").with_display_name("Me")),
            surface: MemorySurface::new(),
            ui_tx,
        };
        (Arc::new(state), ui_rx)
    }

    #[tokio::test]
    async fn test_join_requires_id() {
        let (state, _rx) = state();
        let req = JoinRequest {
            id: "  ".to_string(),
            display_name: None,
            avatar_url: None,
        };
        let resp = join(State(state), Json(req)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_join_and_leave() {
        let (state, _rx) = state();
        let mut sub = state.presence.subscribe();

        let req = JoinRequest {
            id: "u1".to_string(),
            display_name: Some("Ada".to_string()),
            avatar_url: Some(String::new()),
        };
        let resp = join(State(state.clone()), Json(req)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        match sub.recv().await {
            Some(Delivery::Event(PresenceEvent::Join(user))) => {
                assert_eq!(user.title(), "Ada");
                assert_eq!(user.avatar_url, None);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let Json(users) = list_users(State(state.clone())).await;
        assert_eq!(users.len(), 2);

        let resp = leave(State(state.clone()), Json(LeaveRequest { id: "u1".to_string() })).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = leave(State(state), Json(LeaveRequest { id: "u1".to_string() })).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_set_field_unknown_user() {
        let (state, _rx) = state();
        let resp = set_field(
            State(state),
            Path(("ghost".to_string(), "displayName".to_string())),
            Json(json!("x")),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ui_event_forwarded() {
        let (state, mut rx) = state();
        let resp = ui_event(State(state.clone()), Json(UiEvent::Collapse)).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(rx.recv().await, Some(UiEvent::Collapse));

        drop(rx);
        let resp = ui_event(State(state), Json(UiEvent::Edit)).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_index_before_mount() {
        let (state, _rx) = state();
        let Html(page) = index(State(state)).await;
        assert!(page.contains("Room: lobby"));
        assert!(!page.contains(r#"<ul class="gi-inner">"#));
    }
}
