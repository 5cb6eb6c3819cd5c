//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::room::{PeerHandle, PeerId};
use crate::util::rate_limit::PeerRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};
use crate::ws::routing::route;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let peer_id = Uuid::new_v4();
    info!(peer_id = %peer_id, "New WebSocket connection");

    let (ws_sink, mut ws_stream) = socket.split();
    let (tx, rx) = mpsc::channel(state.config.peer_channel_capacity);
    let handle = PeerHandle::new(peer_id, tx);

    let writer_handle = tokio::spawn(write_loop(peer_id, ws_sink, rx));

    let rate_limiter = PeerRateLimiter::new(state.config.input_rate_limit);

    // Reader loop: WebSocket -> registry
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(peer_id = %peer_id, "Rate limited inbound message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => dispatch(&state, &handle, msg),
                    Err(e) => {
                        debug!(peer_id = %peer_id, error = %e, "Dropping malformed message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(peer_id = %peer_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(peer_id = %peer_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(peer_id = %peer_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    state.rooms.leave(peer_id);
    drop(handle);
    writer_handle.abort();

    info!(peer_id = %peer_id, "WebSocket connection closed");
}

/// Apply one inbound message: membership changes go to the registry, the
/// rest is routed and relayed
fn dispatch(state: &AppState, peer: &PeerHandle, msg: ClientMsg) {
    match msg {
        ClientMsg::JoinRoom(payload) => {
            if let Err(e) = state.rooms.join(peer.clone(), payload.room_id(), payload.role()) {
                warn!(peer_id = %peer.id, error = %e, "Join rejected");
            }
        }
        ClientMsg::LeaveRoom => {
            state.rooms.leave(peer.id);
        }
        msg => {
            let Some(membership) = state.rooms.membership(peer.id) else {
                debug!(peer_id = %peer.id, event = msg.event_name(), "Message from peer outside any room");
                return;
            };

            match route(&membership, &msg) {
                Ok((scope, out)) => {
                    let delivered = state.rooms.relay(peer.id, scope, out);
                    debug!(
                        peer_id = %peer.id,
                        room_id = %membership.room_id,
                        event = msg.event_name(),
                        delivered,
                        "Relayed"
                    );
                }
                Err(e) => {
                    debug!(peer_id = %peer.id, error = %e, "Dropping message");
                }
            }
        }
    }
}

/// Writer task: outbound channel -> WebSocket
async fn write_loop(
    peer_id: PeerId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerMsg>,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(peer_id = %peer_id, error = %e, "WebSocket send failed");
            break;
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}
