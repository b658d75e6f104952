//! Presence list demo server.
//!
//! Runs a `UserList` against an in-process presence cache and serves the
//! rendered widget. Other collaborators are simulated through the JSON API.
//!
//! Environment:
//!
//! - `USERLIST_ADDR`: listen address (default `127.0.0.1:3000`)
//! - `USERLIST_OPTIONS`: list options as a JSON object (default `{"room":"lobby"}`)
//! - `USERLIST_NAME`: the local user's display name (default `Guest 1`)

use axum::{
    routing::{get, post},
    Router,
};
use std::env;
use std::sync::Arc;
use tokio::sync::mpsc;

use presence_list::{handlers, AppState, LocalPresence, MemorySurface, User, UserList};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_NAME: &str = "Guest 1";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = env::var("USERLIST_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let options: serde_json::Value = match env::var("USERLIST_OPTIONS") {
        Ok(raw) => serde_json::from_str(&raw)?,
        Err(_) => serde_json::json!({ "room": "lobby" }),
    };
    let name = env::var("USERLIST_NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string());

    let presence = LocalPresence::new(User::new("local").with_display_name(name));
    let surface = MemorySurface::new();

    let mut list = UserList::from_value(&options, presence.clone(), surface.clone())?;
    list.initialize().await?;
    let room = list.options().room.clone();

    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let list_task = tokio::spawn(async move {
        list.run(ui_rx).await;
        list
    });

    let state = Arc::new(AppState {
        room: room.clone(),
        presence,
        surface,
        ui_tx,
    });

    let app = Router::new()
        .route("/", get(handlers::index))
        .route("/api/users", get(handlers::list_users))
        .route("/api/join", post(handlers::join))
        .route("/api/leave", post(handlers::leave))
        .route("/api/users/{id}/{field}", post(handlers::set_field))
        .route("/api/ui", post(handlers::ui_event))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %room, "presence list running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    // The router (and its UI sender) is gone, so the list's loop has ended.
    let mut list = list_task.await?;
    list.destroy().await?;

    Ok(())
}
