//! HTTP routes and the per-socket WebSocket loop.

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::Method,
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::relay::RoomRegistry;

pub fn router(registry: RoomRegistry) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/ws/{room_id}", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(registry): State<RoomRegistry>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, room_id, registry))
}

async fn handle_socket(socket: WebSocket, room_id: String, registry: RoomRegistry) {
    let (id, mut outbound) = match registry.join(&room_id) {
        Ok(joined) => joined,
        Err(e) => {
            tracing::error!("[relay] failed to admit socket to {room_id}: {e}");
            return;
        }
    };
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_registry = registry.clone();
    let recv_room = room_id.clone();
    let recv_id = id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => {
                    if let Err(e) = recv_registry.handle_frame(&recv_room, &recv_id, text.as_str()) {
                        tracing::warn!("[relay] dropped frame from {recv_id}: {e}");
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    registry.leave(&room_id, &id);
}
