//! Hub transport: every message relayed through the central websocket hub
//!
//! This is the baseline path all peers can always reach. The relay assigns
//! identities, announces joins and quits, and forwards tagged text frames.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, warn};

use super::protocol::{format_client_frame, parse_relay_frame, MsgKind, PeerId, RelayFrame};
use super::transport::{RelayPath, Transport};

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Hub-relayed transport. Cheap to clone; all clones share the outbound
/// queue of one websocket connection.
#[derive(Clone)]
pub struct HubTransport {
    out_tx: mpsc::UnboundedSender<String>,
}

impl HubTransport {
    /// Connect to the relay and join a room.
    ///
    /// Returns the transport plus the stream of parsed inbound frames.
    /// Reading and writing run on their own tasks so neither can block the
    /// engine tick.
    pub async fn connect(
        relay_url: &str,
        room: &str,
    ) -> Result<(Self, mpsc::Receiver<RelayFrame>), TransportError> {
        let url = format!("{}/ws/{}", relay_url.trim_end_matches('/'), room);
        let (socket, _) = connect_async(&url).await?;
        let (mut ws_sink, mut ws_stream) = socket.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (frame_tx, frame_rx) = mpsc::channel(256);

        // Writer task: outbound queue -> websocket
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = ws_sink.send(Message::Text(text)).await {
                    debug!(error = %e, "Hub send failed, closing writer");
                    break;
                }
            }
        });

        // Reader task: websocket -> parsed frames
        tokio::spawn(async move {
            while let Some(result) = ws_stream.next().await {
                match result {
                    Ok(Message::Text(text)) => match parse_relay_frame(&text) {
                        Ok(frame) => {
                            if frame_tx.send(frame).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Skipping malformed hub frame");
                        }
                    },
                    Ok(Message::Close(_)) => {
                        debug!("Hub closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "Hub connection error");
                        break;
                    }
                }
            }
        });

        Ok((Self { out_tx }, frame_rx))
    }

    /// Transport with no connection behind it; the outbound queue is handed
    /// back so tests can observe what would have gone to the relay
    #[cfg(test)]
    pub(crate) fn capturing() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        (Self { out_tx }, out_rx)
    }

    /// Enqueue an already-framed message for the relay
    pub fn send_raw(&self, frame: String) {
        // A closed writer means we are shutting down; nothing to surface
        let _ = self.out_tx.send(frame);
    }
}

impl Transport for HubTransport {
    fn send(&self, kind: MsgKind, payload: &str, target: Option<PeerId>) {
        self.send_raw(format_client_frame(target, kind, payload));
    }

    fn drop_peer(&self, _id: PeerId) {}

    fn relay_type(&self, _id: PeerId) -> RelayPath {
        RelayPath::Hub
    }
}
