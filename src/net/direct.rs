//! Direct peer transport: per-peer UDP channels negotiated over the hub
//!
//! On every peer join a signaling state machine is created for that peer.
//! The side with the numerically lower identity binds a socket and sends an
//! offer over the hub; the other side answers with its own address. Once the
//! channel handshake completes the UDP path is preferred for that peer, with
//! the hub as bootstrap and permanent fallback whenever setup fails.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::hub::HubTransport;
use super::protocol::{
    format_client_frame, format_direct_frame, parse_direct_frame, FrameKind, MsgKind, PeerId,
    RelayFrame, SessionDesc,
};
use super::transport::{frame_to_event, RelayPath, Transport, TransportEvent};

/// How long the channel handshake may take before falling back to the hub
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
/// Handshake datagram cadence
const HANDSHAKE_INTERVAL: Duration = Duration::from_millis(250);

/// Per-peer signaling progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    /// Link created, no negotiation yet
    New,
    /// We initiated and sent our offer
    OfferSent,
    /// We responded to an offer with an answer
    AnswerSent,
    /// Direct channel open and preferred
    Connected,
    /// Negotiation failed or torn down; hub serves this peer permanently
    Closed,
}

/// The numerically lower identity initiates the offer
pub(crate) fn initiates(my_id: PeerId, peer_id: PeerId) -> bool {
    my_id < peer_id
}

struct PeerLink {
    state: SignalingState,
    /// Bound socket held between offer and answer (initiator side)
    socket: Option<Arc<UdpSocket>>,
    /// Handshake token carried in the session description
    token: u64,
    /// Outbound queue into the channel pump, once it exists
    udp_tx: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

impl PeerLink {
    fn new() -> Self {
        Self {
            state: SignalingState::New,
            socket: None,
            token: 0,
            udp_tx: None,
            task: None,
        }
    }
}

struct DirectInner {
    hub: HubTransport,
    bind_addr: SocketAddr,
    /// Zero until the relay assigns our identity
    my_id: AtomicU64,
    peers: Mutex<HashMap<PeerId, PeerLink>>,
    events_tx: mpsc::Sender<TransportEvent>,
}

impl DirectInner {
    fn set_state(&self, peer: PeerId, state: SignalingState) {
        if let Some(link) = self.peers.lock().get_mut(&peer) {
            link.state = state;
        }
    }

    fn close(&self, peer: PeerId) {
        if let Some(link) = self.peers.lock().get_mut(&peer) {
            link.state = SignalingState::Closed;
            link.udp_tx = None;
            link.socket = None;
        }
    }

    /// Abort any direct channel but keep the peer reachable over the hub.
    ///
    /// Used for game-level drops (staleness eviction); the peer may still be
    /// alive and resume reporting, so broadcasts must keep flowing to it.
    fn downgrade(&self, peer: PeerId) {
        if let Some(link) = self.peers.lock().get_mut(&peer) {
            if let Some(task) = link.task.take() {
                task.abort();
            }
            link.state = SignalingState::Closed;
            link.udp_tx = None;
            link.socket = None;
        }
    }

    /// Forget the peer entirely; only for relay-announced quits
    fn teardown(&self, peer: PeerId) {
        if let Some(link) = self.peers.lock().remove(&peer) {
            if let Some(task) = link.task {
                task.abort();
            }
        }
    }
}

/// Direct-peer-preferred transport layered over the hub
#[derive(Clone)]
pub struct DirectTransport {
    inner: Arc<DirectInner>,
}

impl DirectTransport {
    /// Wrap a hub connection, intercepting signaling frames and producing
    /// engine events for everything else.
    pub fn new(
        hub: HubTransport,
        frames: mpsc::Receiver<RelayFrame>,
        bind_addr: SocketAddr,
    ) -> (Self, mpsc::Receiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::channel(256);

        let inner = Arc::new(DirectInner {
            hub,
            bind_addr,
            my_id: AtomicU64::new(0),
            peers: Mutex::new(HashMap::new()),
            events_tx,
        });

        tokio::spawn(dispatch(inner.clone(), frames));

        (Self { inner }, events_rx)
    }
}

impl Transport for DirectTransport {
    fn send(&self, kind: MsgKind, payload: &str, target: Option<PeerId>) {
        match target {
            Some(id) => self.send_to_peer(id, kind, payload),
            None => {
                // Broadcast is per-peer so each one takes its best path
                let ids: Vec<PeerId> = self.inner.peers.lock().keys().copied().collect();
                for id in ids {
                    self.send_to_peer(id, kind, payload);
                }
            }
        }
    }

    fn drop_peer(&self, id: PeerId) {
        self.inner.downgrade(id);
    }

    fn relay_type(&self, id: PeerId) -> RelayPath {
        match self.inner.peers.lock().get(&id).map(|link| link.state) {
            Some(SignalingState::Connected) => RelayPath::Direct,
            _ => RelayPath::Hub,
        }
    }
}

impl DirectTransport {
    fn send_to_peer(&self, id: PeerId, kind: MsgKind, payload: &str) {
        let peers = self.inner.peers.lock();
        if let Some(link) = peers.get(&id) {
            if link.state == SignalingState::Connected {
                if let Some(udp_tx) = &link.udp_tx {
                    if udp_tx.send(format_direct_frame(kind, payload)).is_ok() {
                        return;
                    }
                }
            }
        }
        drop(peers);

        self.inner
            .hub
            .send_raw(format_client_frame(Some(id), kind, payload));
    }
}

/// Route inbound hub frames: signaling stays inside the transport, game
/// frames become engine events.
async fn dispatch(inner: Arc<DirectInner>, mut frames: mpsc::Receiver<RelayFrame>) {
    while let Some(frame) = frames.recv().await {
        match frame.kind {
            FrameKind::SelfId => {
                inner.my_id.store(frame.source, Ordering::Relaxed);
                forward(&inner, frame).await;
            }
            FrameKind::Join => {
                let peer = frame.source;
                inner.peers.lock().insert(peer, PeerLink::new());

                let my_id = inner.my_id.load(Ordering::Relaxed);
                if initiates(my_id, peer) {
                    tokio::spawn(send_offer(inner.clone(), peer));
                }
                forward(&inner, frame).await;
            }
            FrameKind::Quit => {
                inner.teardown(frame.source);
                forward(&inner, frame).await;
            }
            FrameKind::Offer => {
                tokio::spawn(recv_offer(inner.clone(), frame.source, frame.payload));
            }
            FrameKind::Answer => {
                tokio::spawn(recv_answer(inner.clone(), frame.source, frame.payload));
            }
            FrameKind::Report => forward(&inner, frame).await,
        }
    }
}

async fn forward(inner: &DirectInner, frame: RelayFrame) {
    if let Some(event) = frame_to_event(frame) {
        let _ = inner.events_tx.send(event).await;
    }
}

/// Initiator: bind a socket and offer its address to the new peer
async fn send_offer(inner: Arc<DirectInner>, peer: PeerId) {
    let socket = match UdpSocket::bind(inner.bind_addr).await {
        Ok(socket) => Arc::new(socket),
        Err(e) => {
            warn!(peer_id = %peer, error = %e, "Direct channel bind failed, staying on hub");
            inner.close(peer);
            return;
        }
    };

    let addr = match socket.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(peer_id = %peer, error = %e, "Direct channel bind failed, staying on hub");
            inner.close(peer);
            return;
        }
    };

    let token = rand::random::<u64>();
    let desc = SessionDesc { addr, token };
    let payload = match serde_json::to_string(&desc) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(peer_id = %peer, error = %e, "Failed to encode offer");
            inner.close(peer);
            return;
        }
    };

    {
        let mut peers = inner.peers.lock();
        let link = peers.entry(peer).or_insert_with(PeerLink::new);
        if link.state != SignalingState::New {
            return;
        }
        link.state = SignalingState::OfferSent;
        link.socket = Some(socket);
        link.token = token;
    }

    debug!(peer_id = %peer, %addr, "Sending direct channel offer");
    inner
        .hub
        .send_raw(format_client_frame(Some(peer), MsgKind::Offer, &payload));
}

/// Responder: bind, answer with our own address, start the channel pump
async fn recv_offer(inner: Arc<DirectInner>, peer: PeerId, payload: String) {
    let desc: SessionDesc = match serde_json::from_str(&payload) {
        Ok(desc) => desc,
        Err(e) => {
            warn!(peer_id = %peer, error = %e, "Malformed offer, staying on hub");
            inner.close(peer);
            return;
        }
    };

    let socket = match bind_and_connect(inner.bind_addr, desc.addr).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!(peer_id = %peer, error = %e, "Direct channel setup failed, staying on hub");
            inner.close(peer);
            return;
        }
    };

    let answer = match socket.local_addr() {
        Ok(addr) => SessionDesc {
            addr,
            token: desc.token,
        },
        Err(e) => {
            warn!(peer_id = %peer, error = %e, "Direct channel setup failed, staying on hub");
            inner.close(peer);
            return;
        }
    };

    let payload = match serde_json::to_string(&answer) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(peer_id = %peer, error = %e, "Failed to encode answer");
            inner.close(peer);
            return;
        }
    };

    start_pump(&inner, peer, socket, desc.token, SignalingState::AnswerSent);

    debug!(peer_id = %peer, "Sending direct channel answer");
    inner
        .hub
        .send_raw(format_client_frame(Some(peer), MsgKind::Answer, &payload));
}

/// Initiator: connect the held socket to the answered address and start the
/// channel pump
async fn recv_answer(inner: Arc<DirectInner>, peer: PeerId, payload: String) {
    let desc: SessionDesc = match serde_json::from_str(&payload) {
        Ok(desc) => desc,
        Err(e) => {
            warn!(peer_id = %peer, error = %e, "Malformed answer, staying on hub");
            inner.close(peer);
            return;
        }
    };

    let (socket, token) = {
        let mut peers = inner.peers.lock();
        match peers.get_mut(&peer) {
            Some(link) if link.state == SignalingState::OfferSent => {
                match (link.socket.take(), link.token) {
                    (Some(socket), token) => (socket, token),
                    (None, _) => return,
                }
            }
            _ => {
                debug!(peer_id = %peer, "Ignoring answer outside OfferSent");
                return;
            }
        }
    };

    if desc.token != token {
        warn!(peer_id = %peer, "Answer token mismatch, staying on hub");
        inner.close(peer);
        return;
    }

    if let Err(e) = socket.connect(desc.addr).await {
        warn!(peer_id = %peer, error = %e, "Direct channel connect failed, staying on hub");
        inner.close(peer);
        return;
    }

    start_pump(&inner, peer, socket, token, SignalingState::OfferSent);
}

async fn bind_and_connect(
    bind_addr: SocketAddr,
    remote: SocketAddr,
) -> std::io::Result<Arc<UdpSocket>> {
    let socket = UdpSocket::bind(bind_addr).await?;
    socket.connect(remote).await?;
    Ok(Arc::new(socket))
}

fn start_pump(
    inner: &Arc<DirectInner>,
    peer: PeerId,
    socket: Arc<UdpSocket>,
    token: u64,
    state: SignalingState,
) {
    let (udp_tx, udp_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(pump(inner.clone(), peer, socket, token, udp_rx));

    let mut peers = inner.peers.lock();
    let link = peers.entry(peer).or_insert_with(PeerLink::new);
    link.state = state;
    link.udp_tx = Some(udp_tx);
    link.task = Some(task);
}

/// Channel pump: completes the handshake, then shuttles frames both ways.
///
/// Any failure closes the machine and the peer stays on the hub; the engine
/// never notices beyond the relay-type diagnostic.
async fn pump(
    inner: Arc<DirectInner>,
    peer: PeerId,
    socket: Arc<UdpSocket>,
    token: u64,
    mut udp_rx: mpsc::UnboundedReceiver<String>,
) {
    let syn = format!("syn {}", token);
    let ack = format!("ack {}", token);
    let mut buf = vec![0u8; 64 * 1024];
    let mut connected = false;

    let deadline = tokio::time::Instant::now() + HANDSHAKE_TIMEOUT;
    let mut handshake = tokio::time::interval(HANDSHAKE_INTERVAL);

    loop {
        tokio::select! {
            _ = handshake.tick(), if !connected => {
                if tokio::time::Instant::now() >= deadline {
                    warn!(peer_id = %peer, "Direct channel handshake timed out, staying on hub");
                    inner.close(peer);
                    return;
                }
                let _ = socket.send(syn.as_bytes()).await;
            }

            outbound = udp_rx.recv(), if connected => {
                match outbound {
                    Some(text) => {
                        if socket.send(text.as_bytes()).await.is_err() {
                            warn!(peer_id = %peer, "Direct channel send failed, staying on hub");
                            inner.close(peer);
                            return;
                        }
                    }
                    // Sender side dropped: link torn down
                    None => return,
                }
            }

            received = socket.recv(&mut buf) => {
                let len = match received {
                    Ok(len) => len,
                    Err(e) => {
                        warn!(peer_id = %peer, error = %e, "Direct channel receive failed, staying on hub");
                        inner.close(peer);
                        return;
                    }
                };

                let text = String::from_utf8_lossy(&buf[..len]).into_owned();
                if text == syn {
                    let _ = socket.send(ack.as_bytes()).await;
                    if !connected {
                        connected = true;
                        inner.set_state(peer, SignalingState::Connected);
                        info!(peer_id = %peer, "Direct channel open");
                    }
                } else if text == ack {
                    if !connected {
                        connected = true;
                        inner.set_state(peer, SignalingState::Connected);
                        info!(peer_id = %peer, "Direct channel open");
                    }
                } else if connected {
                    match parse_direct_frame(peer, &text) {
                        Ok(frame) => forward(&inner, frame).await,
                        Err(e) => warn!(peer_id = %peer, error = %e, "Skipping malformed direct frame"),
                    }
                }
            }
        }
    }
}
