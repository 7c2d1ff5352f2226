//! Message relay: rooms, identity assignment and frame forwarding
//!
//! The relay is intentionally dumb. It assigns each connection a numeric id
//! within its room, announces joins and quits, and forwards text frames by
//! their target prefix. It never inspects payloads, so the report and
//! signaling formats can evolve without touching it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::net::protocol::{PeerId, BROADCAST};
use crate::util::rate_limit::ConnectionRateLimiter;

/// One room full of peers.
///
/// Ids are assigned incrementally and never reused within a room's lifetime,
/// which keeps the lower-id-initiates signaling rule stable.
struct Room {
    next_id: AtomicU64,
    peers: parking_lot::Mutex<HashMap<PeerId, mpsc::UnboundedSender<String>>>,
}

impl Room {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            peers: parking_lot::Mutex::new(HashMap::new()),
        }
    }
}

/// Shared relay state
#[derive(Clone)]
pub struct RelayState {
    rooms: Arc<DashMap<String, Arc<Room>>>,
}

impl RelayState {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
        }
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the relay router
pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws/:room", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    rooms: usize,
    peers: usize,
}

async fn health_handler(State(state): State<RelayState>) -> Json<HealthResponse> {
    let peers = state
        .rooms
        .iter()
        .map(|room| room.peers.lock().len())
        .sum();

    Json(HealthResponse {
        status: "ok",
        rooms: state.rooms.len(),
        peers,
    })
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(state): State<RelayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, room, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, room_name: String, state: RelayState) {
    let room = state
        .rooms
        .entry(room_name.clone())
        .or_insert_with(|| Arc::new(Room::new()))
        .clone();

    let id = room.next_id.fetch_add(1, Ordering::Relaxed);
    info!(room = %room_name, peer_id = %id, "Peer connected");

    let (mut ws_sink, mut ws_stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    // Identity first, then the current roster, so the newcomer can open
    // channels toward everyone already present
    let _ = out_tx.send(format!("{} self", id));
    {
        let mut peers = room.peers.lock();
        for (peer_id, peer_tx) in peers.iter() {
            let _ = out_tx.send(format!("{} join", peer_id));
            let _ = peer_tx.send(format!("{} join", id));
        }
        peers.insert(id, out_tx);
    }

    // Writer task: room traffic -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(text)).await {
                debug!(peer_id = %id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> addressed peers
    let rate_limiter = ConnectionRateLimiter::new();
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_msg() {
                    warn!(room = %room_name, peer_id = %id, "Rate limited message");
                    continue;
                }
                forward(&room, id, &text);
            }
            Ok(Message::Binary(_)) => {
                warn!(peer_id = %id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!(peer_id = %id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(peer_id = %id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();

    // Withdraw from the room and announce the departure
    let empty = {
        let mut peers = room.peers.lock();
        peers.remove(&id);
        for peer_tx in peers.values() {
            let _ = peer_tx.send(format!("{} quit", id));
        }
        peers.is_empty()
    };

    if empty {
        state
            .rooms
            .remove_if(&room_name, |_, room| room.peers.lock().is_empty());
    }

    info!(room = %room_name, peer_id = %id, "Peer disconnected");
}

/// Forward `"<target> <msg>"` as `"<source> <msg>"` to its addressees
fn forward(room: &Room, source: PeerId, raw: &str) {
    let Some((target, msg)) = raw.split_once(' ') else {
        warn!(peer_id = %source, "Dropping unaddressed frame");
        return;
    };

    let delivery = format!("{} {}", source, msg);
    let peers = room.peers.lock();

    if target == BROADCAST {
        for (peer_id, peer_tx) in peers.iter() {
            if *peer_id != source {
                let _ = peer_tx.send(delivery.clone());
            }
        }
        return;
    }

    match target.parse::<PeerId>() {
        Ok(target_id) => match peers.get(&target_id) {
            Some(peer_tx) => {
                let _ = peer_tx.send(delivery);
            }
            // Target already gone; normal during quits, drop silently
            None => debug!(peer_id = %source, target = %target_id, "Dropping frame for absent peer"),
        },
        Err(_) => {
            warn!(peer_id = %source, target = %target, "Dropping frame with bad target");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_peers(ids: &[PeerId]) -> (Arc<Room>, HashMap<PeerId, mpsc::UnboundedReceiver<String>>) {
        let room = Arc::new(Room::new());
        let mut rxs = HashMap::new();
        for &id in ids {
            let (tx, rx) = mpsc::unbounded_channel();
            room.peers.lock().insert(id, tx);
            rxs.insert(id, rx);
        }
        (room, rxs)
    }

    #[test]
    fn broadcast_reaches_everyone_but_the_source() {
        let (room, mut rxs) = room_with_peers(&[1, 2, 3]);

        forward(&room, 1, "* report {}");

        assert!(rxs.get_mut(&1).unwrap().try_recv().is_err());
        assert_eq!(rxs.get_mut(&2).unwrap().try_recv().unwrap(), "1 report {}");
        assert_eq!(rxs.get_mut(&3).unwrap().try_recv().unwrap(), "1 report {}");
    }

    #[test]
    fn targeted_frame_reaches_only_its_target() {
        let (room, mut rxs) = room_with_peers(&[1, 2, 3]);

        forward(&room, 2, "3 offer {\"addr\":\"127.0.0.1:9\",\"token\":1}");

        assert!(rxs.get_mut(&1).unwrap().try_recv().is_err());
        assert_eq!(
            rxs.get_mut(&3).unwrap().try_recv().unwrap(),
            "2 offer {\"addr\":\"127.0.0.1:9\",\"token\":1}"
        );
    }

    #[test]
    fn frames_for_absent_or_bad_targets_are_dropped() {
        let (room, mut rxs) = room_with_peers(&[1]);

        forward(&room, 1, "9 report {}");
        forward(&room, 1, "x report {}");
        forward(&room, 1, "unaddressed");

        assert!(rxs.get_mut(&1).unwrap().try_recv().is_err());
    }

    #[test]
    fn ids_are_incremental_and_never_reused() {
        let room = Room::new();
        assert_eq!(room.next_id.fetch_add(1, Ordering::Relaxed), 1);
        assert_eq!(room.next_id.fetch_add(1, Ordering::Relaxed), 2);
        assert_eq!(room.next_id.fetch_add(1, Ordering::Relaxed), 3);
    }
}
