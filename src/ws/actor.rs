use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::hub::ConnectionId;
use crate::state::AppState;
use crate::ws::broadcast;
use crate::ws::protocol::ClientFrame;

/// Ping interval: server sends WebSocket ping every 30 seconds.
/// Prevents connection leaks from abrupt disconnects.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if pong not received within 10 seconds after ping, close.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the actor-per-connection pattern for one WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Reader loop: decodes inbound frames and hands them to the hub
///
/// The mpsc channel is registered in the sender map so the broadcast
/// gateway can push frames to this client from any transition.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    // Register with the hub first, then make the connection routable, then
    // deliver the greeting (active-rooms snapshot) through the gateway.
    let (conn_id, greeting) = {
        let mut hub = state.hub.lock().expect("hub lock");
        hub.connect()
    };
    state.senders.insert(conn_id, tx.clone());
    broadcast::deliver_all(&state.senders, greeting);

    tracing::info!(conn_id = %conn_id, "WebSocket actor started");

    // Spawn writer task: forwards mpsc messages to the WebSocket sink
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();

    // Spawn ping task: sends periodic pings and monitors pong responses
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer task has died — connection is gone
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {
                    // Pong received, continue
                }
                _ => {
                    tracing::warn!(conn_id = %conn_id, "Pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader loop: process incoming WebSocket messages
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    handle_text_frame(&state, conn_id, text.as_str());
                }
                Message::Binary(_) => {
                    tracing::debug!(
                        conn_id = %conn_id,
                        "Ignoring binary frame (protocol is JSON text)"
                    );
                }
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(
                        conn_id = %conn_id,
                        reason = ?frame,
                        "Client initiated close"
                    );
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(
                    conn_id = %conn_id,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
            None => {
                // Stream ended — client disconnected
                break;
            }
        }
    }

    // Cleanup: abort writer and ping tasks
    writer_handle.abort();
    ping_handle.abort();

    // Drop the sender route first so nothing addressed to this connection
    // lands on a dead channel, then run the hub's disconnect transition
    // (implicit leave) and deliver whatever it emits to the survivors.
    state.senders.remove(&conn_id);
    let farewell = {
        let mut hub = state.hub.lock().expect("hub lock");
        hub.disconnect(conn_id)
    };
    broadcast::deliver_all(&state.senders, farewell);

    tracing::info!(conn_id = %conn_id, "WebSocket actor stopped");
}

/// Decode one inbound text frame and run it through the hub. Undecodable
/// frames and rejected events are logged and dropped; per the propagation
/// policy, one bad event never corrupts state or halts the actor.
fn handle_text_frame(state: &AppState, conn_id: ConnectionId, raw: &str) {
    let frame: ClientFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(
                conn_id = %conn_id,
                error = %e,
                "Failed to decode client frame: {}",
                raw.chars().take(100).collect::<String>()
            );
            return;
        }
    };

    let result = {
        let mut hub = state.hub.lock().expect("hub lock");
        hub.apply(conn_id, frame)
    };

    match result {
        Ok(batch) => broadcast::deliver_all(&state.senders, batch),
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, error = %e, "Event rejected");
        }
    }
}

/// Writer task: receives messages from mpsc channel and forwards them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken
            break;
        }
    }
}
