use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::models::{OrderUpdate, SectionInstance};

/// How often to send WebSocket Ping frames.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// How long to wait for a Pong response before considering the connection dead.
const PONG_TIMEOUT: Duration = Duration::from_secs(60);

// ── WebSocket message types ──────────────────────────────────────────

/// Change notifications pushed to every connected admin page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    SectionCreated { section: SectionInstance },
    SectionUpdated { section: SectionInstance },
    SectionDeleted { section_id: String },
    SectionsReordered { updates: Vec<OrderUpdate> },
    SectionsReset { sections: Vec<SectionInstance> },
}

// ── WebSocket handler ────────────────────────────────────────────────

pub async fn ws_handler_with_sender(
    ws: WebSocketUpgrade,
    tx: broadcast::Sender<String>,
) -> impl IntoResponse {
    // Subscribe before the upgrade so nothing published during the handshake is missed.
    let rx = tx.subscribe();
    ws.on_upgrade(move |socket| serve_preview_client(socket, rx))
}

async fn serve_preview_client(socket: WebSocket, rx: broadcast::Receiver<String>) {
    debug!("preview client connected");
    let (sink, stream) = socket.split();
    let reason = forward_events(sink, stream, rx).await;
    debug!(?reason, "preview client disconnected");
}

/// Why a preview connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disconnect {
    ClientGone,
    SendFailed,
    PongTimeout,
    ChannelClosed,
}

/// Push every broadcast event to one preview client.
///
/// Pings go out every [`PING_INTERVAL`]. A ping left unanswered for longer
/// than [`PONG_TIMEOUT`] ends the connection.
async fn forward_events(
    mut sink: SplitSink<WebSocket, Message>,
    mut stream: SplitStream<WebSocket>,
    mut rx: broadcast::Receiver<String>,
) -> Disconnect {
    let mut keepalive = tokio::time::interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);
    let mut unanswered_since: Option<Instant> = None;

    let reason = loop {
        tokio::select! {
            _ = keepalive.tick() => {
                if unanswered_since.is_some_and(|sent| sent.elapsed() > PONG_TIMEOUT) {
                    break Disconnect::PongTimeout;
                }
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break Disconnect::SendFailed;
                }
                if unanswered_since.is_none() {
                    unanswered_since = Some(Instant::now());
                }
            }

            event = rx.recv() => match event {
                Ok(json) => {
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break Disconnect::SendFailed;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "preview client lagging, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break Disconnect::ChannelClosed,
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Pong(_))) => unanswered_since = None,
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break Disconnect::ClientGone,
                Some(Ok(_)) => {}
            },
        }
    };

    if reason != Disconnect::SendFailed {
        let _ = sink.send(Message::Close(None)).await;
    }
    reason
}

// ── Broadcast helper ─────────────────────────────────────────────────

/// Serialize and broadcast a WsMessage. No connected clients is not an error.
pub fn broadcast_message(tx: &broadcast::Sender<String>, msg: &WsMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => {
            let _ = tx.send(json);
        }
        Err(e) => {
            warn!(error = %e, "failed to serialize websocket message");
        }
    }
}
