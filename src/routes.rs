use axum::{extract::State, Json, Router};

use crate::hub::directory::RoomSummary;
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Build the full axum Router.
pub fn build_router(state: AppState) -> Router {
    // WebSocket endpoint — all chat traffic flows through here
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    // Read-only REST surface
    let api_routes = Router::new().route("/api/rooms", axum::routing::get(list_rooms));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(ws_routes)
        .merge(api_routes)
        .merge(health)
        .with_state(state)
}

/// GET /api/rooms — Snapshot of active rooms with member counts, taken
/// under the hub lock.
async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    let snapshot = {
        let hub = state.hub.lock().expect("hub lock");
        hub.rooms_snapshot()
    };
    Json(snapshot)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
