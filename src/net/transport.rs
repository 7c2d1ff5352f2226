//! Transport contract shared by the hub and direct paths
//!
//! Inbound traffic is delivered as [`TransportEvent`]s on an mpsc channel
//! the engine drains once per tick; that channel is the only way network
//! activity reaches the world, so all registry mutation stays on the tick
//! task.

use tokio::sync::mpsc;
use tracing::debug;

use super::protocol::{FrameKind, MsgKind, PeerId, RelayFrame};

/// Inbound events the engine consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The relay assigned this client its identity
    SelfId(PeerId),
    /// A peer joined the room
    Join(PeerId),
    /// A peer left the room
    Quit(PeerId),
    /// A state report arrived from a peer
    Report { from: PeerId, payload: String },
}

/// Which path currently serves a peer, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPath {
    Direct,
    Hub,
}

impl std::fmt::Display for RelayPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayPath::Direct => write!(f, "direct"),
            RelayPath::Hub => write!(f, "hub"),
        }
    }
}

/// Sends typed text messages to one peer or to everyone.
///
/// `send` enqueues; delivery is handled by background tasks and is best
/// effort, matching the loss tolerance of the report protocol.
pub trait Transport: Send + Sync {
    /// Send to one peer, or broadcast when `target` is `None`
    fn send(&self, kind: MsgKind, payload: &str, target: Option<PeerId>);

    /// Close any direct channel to the peer after a quit or staleness
    /// eviction. The hub route stays usable: an evicted peer may still be
    /// alive and must keep receiving broadcasts.
    fn drop_peer(&self, id: PeerId);

    /// Which path currently serves this peer
    fn relay_type(&self, id: PeerId) -> RelayPath;
}

/// Translate a relay frame into an engine event.
///
/// Signaling frames (`offer`/`answer`) are transport-internal and yield no
/// event here; the direct transport intercepts them before this point.
pub fn frame_to_event(frame: RelayFrame) -> Option<TransportEvent> {
    match frame.kind {
        FrameKind::SelfId => Some(TransportEvent::SelfId(frame.source)),
        FrameKind::Join => Some(TransportEvent::Join(frame.source)),
        FrameKind::Quit => Some(TransportEvent::Quit(frame.source)),
        FrameKind::Report => Some(TransportEvent::Report {
            from: frame.source,
            payload: frame.payload,
        }),
        FrameKind::Offer | FrameKind::Answer => {
            debug!(peer_id = %frame.source, "Dropping unexpected signaling frame");
            None
        }
    }
}

/// Pump raw relay frames into engine events for hub-only operation
pub fn spawn_event_pump(
    mut frames: mpsc::Receiver<RelayFrame>,
    events: mpsc::Sender<TransportEvent>,
) {
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if let Some(event) = frame_to_event(frame) {
                if events.send(event).await.is_err() {
                    break;
                }
            }
        }
    });
}
