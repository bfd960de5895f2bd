//! WebSocket transport for the client.
//!
//! One task per connection attempt. The task reports
//! [`SessionEvent::TransportOpened`], forwards every inbound text frame in
//! arrival order, and reports [`SessionEvent::TransportClosed`] exactly once,
//! whatever ended it. This is a thin layer that only moves frames; protocol
//! logic stays in the sans-IO session.

use futures::{SinkExt, StreamExt};
use heisenpad_app::SessionEvent;
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a transport ended.
///
/// Only ever reported as the `reason` of a close event.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection attempt failed.
    #[error("connect failed: {0}")]
    Connect(#[source] tungstenite::Error),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    Send(#[source] tungstenite::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    Receive(#[source] tungstenite::Error),

    /// Server sent a close frame or the stream ended.
    #[error("closed by server")]
    ClosedByServer,

    /// Local side asked to disconnect.
    #[error("closed by client")]
    ClosedByClient,

    /// Nobody is listening for events any more.
    #[error("session gone")]
    SessionGone,
}

/// Handle to one connection task.
///
/// Dropping the handle closes the connection.
#[derive(Debug)]
pub struct TransportHandle {
    outgoing: mpsc::UnboundedSender<String>,
}

impl TransportHandle {
    /// Queue a text frame. Returns `false` if the connection is gone.
    pub fn send(&self, frame: String) -> bool {
        self.outgoing.send(frame).is_ok()
    }
}

/// Open a connection to `url` for `generation` on the current tokio runtime.
pub fn connect(
    generation: u64,
    url: String,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> TransportHandle {
    let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(generation, url, outgoing_rx, events));
    TransportHandle { outgoing }
}

async fn run(
    generation: u64,
    url: String,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let reason = match connect_async(url.as_str()).await {
        Ok((socket, _)) => {
            tracing::debug!(generation, %url, "transport open");
            if events.send(SessionEvent::TransportOpened { generation }).is_err() {
                return;
            }
            pump(generation, socket, &mut outgoing, &events).await
        },
        Err(e) => TransportError::Connect(e),
    };

    tracing::debug!(generation, %reason, "transport closed");
    let _ = events.send(SessionEvent::TransportClosed { generation, reason: reason.to_string() });
}

/// Move frames both ways until either side ends. Returns why it ended.
async fn pump(
    generation: u64,
    socket: Socket,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
    events: &mpsc::UnboundedSender<SessionEvent>,
) -> TransportError {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = sink.send(tungstenite::Message::Text(frame.into())).await {
                        return TransportError::Send(e);
                    }
                },
                None => {
                    let _ = sink.close().await;
                    return TransportError::ClosedByClient;
                },
            },
            inbound = stream.next() => match inbound {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    let frame = text.as_str().to_owned();
                    if events.send(SessionEvent::FrameReceived { generation, frame }).is_err() {
                        return TransportError::SessionGone;
                    }
                },
                Some(Ok(tungstenite::Message::Close(_))) | None => {
                    return TransportError::ClosedByServer;
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => return TransportError::Receive(e),
            },
        }
    }
}
