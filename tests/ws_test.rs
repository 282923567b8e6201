//! Integration tests for the WebSocket transport: connect greeting, join
//! and chat broadcast fan-out, disconnect cleanup, ping/pong, and the REST
//! room snapshot.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use roomcast_server::hub::{self, Hub};
use roomcast_server::routes;
use roomcast_server::state::AppState;
use roomcast_server::ws;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsReader = futures_util::stream::SplitStream<WsStream>;
type WsWriter = futures_util::stream::SplitSink<WsStream, Message>;

/// Start the server on a random port with the default permanent rooms.
async fn start_test_server() -> SocketAddr {
    let hub = Hub::new(["General".to_string(), "Random".to_string()], 64);
    let state = AppState {
        hub: hub::new_shared(hub),
        senders: ws::new_sender_map(),
    };

    let app = routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

async fn connect_client(addr: SocketAddr) -> (WsWriter, WsReader) {
    let ws_url = format!("ws://{}/ws", addr);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream.split()
}

/// Read frames until one with the given event name arrives; returns its
/// data payload. Skips unrelated broadcasts (other clients' joins etc.).
async fn recv_event(read: &mut WsReader, event: &str) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), read.next())
            .await
            .unwrap_or_else(|_| panic!("Timed out waiting for {event:?}"))
            .expect("Stream ended")
            .expect("WebSocket receive error");

        if let Message::Text(text) = msg {
            let frame: Value = serde_json::from_str(text.as_str()).expect("Invalid frame JSON");
            if frame["event"] == event {
                return frame["data"].clone();
            }
        }
    }
}

async fn send_frame(write: &mut WsWriter, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data });
    write
        .send(Message::text(frame.to_string()))
        .await
        .expect("Failed to send frame");
}

fn user_names(users: &Value) -> Vec<String> {
    users
        .as_array()
        .expect("users array")
        .iter()
        .map(|u| u["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_connect_receives_active_rooms() {
    let addr = start_test_server().await;
    let (_write, mut read) = connect_client(addr).await;

    let rooms = recv_event(&mut read, "active rooms").await;
    assert_eq!(rooms, json!(["General", "Random"]));
}

#[tokio::test]
async fn test_join_announces_room_and_membership() {
    let addr = start_test_server().await;
    let (mut write, mut read) = connect_client(addr).await;
    recv_event(&mut read, "active rooms").await;

    send_frame(&mut write, "join", json!({"name": "Ann", "room": "Lobby"})).await;

    let new_room = recv_event(&mut read, "new room").await;
    assert_eq!(new_room["name"], "Lobby");
    assert_eq!(new_room["id"], "Lobby");

    let users = recv_event(&mut read, "active users").await;
    assert_eq!(users["room"], "Lobby");
    assert_eq!(user_names(&users["users"]), vec!["Ann"]);
}

#[tokio::test]
async fn test_chat_is_relayed_to_room_members_with_sender() {
    let addr = start_test_server().await;
    let (mut write_a, mut read_a) = connect_client(addr).await;
    let (mut write_b, mut read_b) = connect_client(addr).await;

    send_frame(&mut write_a, "join", json!({"name": "Ann", "room": "Lobby"})).await;
    send_frame(&mut write_b, "join", json!({"name": "Ben", "room": "Lobby"})).await;

    // Wait until B's join is visible to both members.
    loop {
        let users = recv_event(&mut read_a, "active users").await;
        if users["users"].as_array().unwrap().len() == 2 {
            break;
        }
    }

    send_frame(
        &mut write_a,
        "chat message",
        json!({"room": "Lobby", "text": "hi all"}),
    )
    .await;

    // Both members receive the message, the sender included.
    for read in [&mut read_a, &mut read_b] {
        let msg = recv_event(read, "chat message").await;
        assert_eq!(msg["room"], "Lobby");
        assert_eq!(msg["text"], "hi all");
        assert_eq!(msg["sender"]["name"], "Ann");
    }
}

#[tokio::test]
async fn test_disconnect_and_leave_close_the_room() {
    let addr = start_test_server().await;
    let (mut write_a, mut read_a) = connect_client(addr).await;
    let (mut write_b, mut read_b) = connect_client(addr).await;

    send_frame(&mut write_a, "join", json!({"name": "Ann", "room": "Lobby"})).await;
    send_frame(&mut write_b, "join", json!({"name": "Ben", "room": "Lobby"})).await;
    loop {
        let users = recv_event(&mut read_a, "active users").await;
        if users["users"].as_array().unwrap().len() == 2 {
            break;
        }
    }

    // A disconnects: B observes the shrunken member list.
    write_a
        .send(Message::Close(None))
        .await
        .expect("Failed to send close");
    loop {
        let users = recv_event(&mut read_b, "active users").await;
        if user_names(&users["users"]) == vec!["Ben"] {
            break;
        }
    }

    // B leaves: the emptied room closes and the closure is broadcast.
    send_frame(&mut write_b, "leave-room", json!("Lobby")).await;
    let closed = recv_event(&mut read_b, "room closed").await;
    assert_eq!(closed, "Lobby");

    // A fresh client no longer sees Lobby in the greeting snapshot.
    let (_write_c, mut read_c) = connect_client(addr).await;
    let rooms = recv_event(&mut read_c, "active rooms").await;
    assert_eq!(rooms, json!(["General", "Random"]));
}

#[tokio::test]
async fn test_create_room_is_broadcast_to_everyone() {
    let addr = start_test_server().await;
    let (mut write_a, mut read_a) = connect_client(addr).await;
    let (_write_b, mut read_b) = connect_client(addr).await;
    recv_event(&mut read_a, "active rooms").await;
    recv_event(&mut read_b, "active rooms").await;

    send_frame(&mut write_a, "create room", json!("Den")).await;

    // Both clients see the announcement, including the one who asked.
    for read in [&mut read_a, &mut read_b] {
        let room = recv_event(read, "new room").await;
        assert_eq!(room["name"], "Den");
    }

    // Creating an existing room announces nothing: the connection stays
    // quiet until something else happens.
    send_frame(&mut write_a, "create room", json!("Den")).await;
    let result = tokio::time::timeout(Duration::from_millis(300), read_a.next()).await;
    assert!(result.is_err(), "Expected no frame after duplicate create");
}

#[tokio::test]
async fn test_ws_ping_pong() {
    let addr = start_test_server().await;
    let (mut write, mut read) = connect_client(addr).await;
    recv_event(&mut read, "active rooms").await;

    write
        .send(Message::Ping(vec![42, 43, 44].into()))
        .await
        .expect("Failed to send ping");

    let msg = tokio::time::timeout(Duration::from_secs(2), read.next())
        .await
        .expect("Expected pong within timeout");

    match msg {
        Some(Ok(Message::Pong(data))) => {
            assert_eq!(data.as_ref(), &[42, 43, 44], "Pong data should match ping");
        }
        other => panic!("Expected Pong message, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_rooms_endpoint_reports_membership_counts() {
    let addr = start_test_server().await;
    let (mut write, mut read) = connect_client(addr).await;
    recv_event(&mut read, "active rooms").await;

    send_frame(&mut write, "join", json!({"name": "Ann", "room": "General"})).await;
    recv_event(&mut read, "active users").await;

    let rooms: Value = reqwest::get(format!("http://{}/api/rooms", addr))
        .await
        .expect("GET /api/rooms failed")
        .json()
        .await
        .expect("Invalid JSON body");

    let general = rooms
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "General")
        .expect("General missing from snapshot");
    assert_eq!(general["members"], 1);
    assert_eq!(general["permanent"], true);
}
