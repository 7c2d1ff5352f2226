//! Wire protocol: relay frame grammar and report payloads
//!
//! Frames are space-separated text. The relay prefixes every delivered frame
//! with the numeric id of its source: `"<source> <type> [payload]"`. Clients
//! address outbound frames with a target id or `*` for broadcast:
//! `"<target> <type> [payload]"`. Payloads are JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sim::body::BodySnapshot;
use crate::sim::missile::MissileSnapshot;
use crate::sim::ship::ShipState;

/// Stable peer identity assigned by the relay.
///
/// Ids are numeric and ordered; signaling uses the ordering to pick the
/// offer initiator.
pub type PeerId = u64;

/// Broadcast address on the relay
pub const BROADCAST: &str = "*";

/// Message types a client sends to peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    Report,
    Offer,
    Answer,
}

impl MsgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MsgKind::Report => "report",
            MsgKind::Offer => "offer",
            MsgKind::Answer => "answer",
        }
    }
}

/// A frame as delivered by the relay (or a direct channel)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFrame {
    pub source: PeerId,
    pub kind: FrameKind,
    pub payload: String,
}

/// Frame types arriving from the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Identity assignment for this client
    SelfId,
    /// A peer joined the room
    Join,
    /// A peer left the room
    Quit,
    /// A state report from a peer
    Report,
    /// Signaling: session offer
    Offer,
    /// Signaling: session answer
    Answer,
}

impl FrameKind {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "self" => Some(FrameKind::SelfId),
            "join" => Some(FrameKind::Join),
            "quit" => Some(FrameKind::Quit),
            "report" => Some(FrameKind::Report),
            "offer" => Some(FrameKind::Offer),
            "answer" => Some(FrameKind::Answer),
            _ => None,
        }
    }
}

/// Parse a frame delivered by the relay: `"<source> <type> [payload]"`
pub fn parse_relay_frame(raw: &str) -> Result<RelayFrame, ProtocolError> {
    let mut parts = raw.splitn(3, ' ');

    let source = parts
        .next()
        .ok_or_else(|| ProtocolError::Malformed(raw.to_string()))?
        .parse::<PeerId>()
        .map_err(|_| ProtocolError::BadSource(raw.to_string()))?;

    let kind_str = parts
        .next()
        .ok_or_else(|| ProtocolError::Malformed(raw.to_string()))?;
    let kind =
        FrameKind::from_str(kind_str).ok_or_else(|| ProtocolError::UnknownType(kind_str.to_string()))?;

    Ok(RelayFrame {
        source,
        kind,
        payload: parts.next().unwrap_or_default().to_string(),
    })
}

/// Parse a message arriving on a direct channel: `"<type> [payload]"`.
///
/// The source is implied by the channel, so the peer id is supplied by the
/// caller.
pub fn parse_direct_frame(source: PeerId, raw: &str) -> Result<RelayFrame, ProtocolError> {
    let mut parts = raw.splitn(2, ' ');

    let kind_str = parts
        .next()
        .ok_or_else(|| ProtocolError::Malformed(raw.to_string()))?;
    let kind =
        FrameKind::from_str(kind_str).ok_or_else(|| ProtocolError::UnknownType(kind_str.to_string()))?;

    Ok(RelayFrame {
        source,
        kind,
        payload: parts.next().unwrap_or_default().to_string(),
    })
}

/// Format an outbound frame for the relay
pub fn format_client_frame(target: Option<PeerId>, kind: MsgKind, payload: &str) -> String {
    match target {
        Some(id) => format!("{} {} {}", id, kind.as_str(), payload),
        None => format!("{} {} {}", BROADCAST, kind.as_str(), payload),
    }
}

/// Format a message for a direct channel (source implied)
pub fn format_direct_frame(kind: MsgKind, payload: &str) -> String {
    format!("{} {}", kind.as_str(), payload)
}

/// A serialized snapshot of one ship's authoritative state, broadcast to
/// peers on input changes and at the keep-alive cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub state: ShipState,
    pub rotation: f64,
    pub thrust: f64,
    /// Sender wall-clock timestamp of its last simulation step (ms)
    pub last_update: f64,
    /// One-way delay the sender has measured for each peer it knows (ms)
    #[serde(default)]
    pub recv_delay: HashMap<PeerId, f64>,
    /// Present while ACTIVE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodySnapshot>,
    /// Present while DESTROYED
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debris: Option<Vec<BodySnapshot>>,
    #[serde(default)]
    pub missiles: Vec<MissileSnapshot>,
}

/// Session description exchanged over the relay during signaling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDesc {
    /// UDP address the peer can be reached at
    pub addr: std::net::SocketAddr,
    /// Random token echoed in the channel handshake
    pub token: u64,
}

/// Protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0:?}")]
    Malformed(String),

    #[error("Frame source is not a peer id: {0:?}")]
    BadSource(String),

    #[error("Unknown message type: {0:?}")]
    UnknownType(String),

    #[error("Bad payload: {0}")]
    BadPayload(#[from] serde_json::Error),
}
