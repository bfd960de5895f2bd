//! WebSocket relay endpoint.
//!
//! One task per connection. Each task owns its socket and the receiving end
//! of its outbound queue; the only shared state is the [`ChannelRegistry`].

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use heisenpad_proto::Channel;
use tokio::{net::TcpListener, sync::RwLock};

use crate::{ChannelRegistry, ConnectionId, Route, ServerConfig, ServerError, route};

#[derive(Clone, Default)]
struct AppState {
    registry: Arc<RwLock<ChannelRegistry>>,
}

/// Relay server bound to a listener.
pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// - `ServerError::Bind` if the address cannot be bound
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_address)
            .await
            .map_err(|source| ServerError::Bind { address: config.bind_address.clone(), source })?;

        Ok(Self { listener, state: AppState::default() })
    }

    /// Address actually bound. Differs from the configured one for port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared registry, for inspection.
    pub fn registry(&self) -> Arc<RwLock<ChannelRegistry>> {
        Arc::clone(&self.state.registry)
    }

    /// Serve until the process exits.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let app = Router::new().route("/ws/{channel}", get(ws_handler)).with_state(self.state);

        axum::serve(self.listener, app).with_graceful_shutdown(shutdown).await?;
        Ok(())
    }
}

async fn ws_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    // Path extraction percent-decodes; re-encode to one canonical key
    let channel = Channel::new(&channel);
    ws.on_upgrade(move |socket| handle_socket(socket, channel, state))
}

async fn handle_socket(socket: WebSocket, channel: Channel, state: AppState) {
    let (id, mut outbound) = state.registry.write().await.register(&channel);
    tracing::info!(%id, channel = channel.as_encoded(), "connection joined");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    tracing::debug!(%id, error = %e, "send failed");
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => relay(&state, &channel, id, text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    tracing::debug!(%id, error = %e, "receive failed");
                    break;
                },
            },
        }
    }

    state.registry.write().await.unregister(&channel, id);
    tracing::info!(%id, channel = channel.as_encoded(), "connection left");
}

async fn relay(state: &AppState, channel: &Channel, id: ConnectionId, frame: &str) {
    match route(frame) {
        Route::Echo => {
            state.registry.read().await.send_to(channel, id, frame);
        },
        Route::Broadcast => {
            let delivered = state.registry.read().await.broadcast(channel, frame);
            tracing::debug!(%id, delivered, "broadcast");
        },
        Route::Drop => {},
    }
}
