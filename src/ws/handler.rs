use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
};

use crate::state::AppState;
use crate::ws::actor;

/// GET /ws
/// WebSocket upgrade endpoint. Connections are anonymous: a client has no
/// name or room until its first join. On upgrade, spawns the per-connection
/// actor.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_connected(socket, state))
}

async fn handle_connected(socket: WebSocket, state: AppState) {
    actor::run_connection(socket, state).await;
}
