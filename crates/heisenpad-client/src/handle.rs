//! Presentation-facing handle to a running session.

use heisenpad_app::{Runtime, Session, SessionRequest, SessionSnapshot};
use heisenpad_proto::{Channel, Message};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{ClientConfig, ClientError, SystemEnv, WsDriver};

/// Cloneable front door to a session running on a tokio task.
///
/// Requests are queued and processed one at a time by the runtime. State
/// comes back as [`SessionSnapshot`]s published after every change.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    requests: mpsc::Sender<SessionRequest>,
    snapshots: watch::Receiver<Option<SessionSnapshot>>,
}

impl SessionHandle {
    /// Switch channel.
    pub async fn join(&self, channel: &str) -> Result<(), ClientError> {
        self.request(SessionRequest::Join(Channel::new(channel))).await
    }

    /// Replace the passphrase. Empty disables encryption.
    pub async fn set_passphrase(&self, passphrase: &str) -> Result<(), ClientError> {
        self.request(SessionRequest::SetPassphrase(passphrase.to_string())).await
    }

    /// Send a text message.
    pub async fn send_text(&self, text: &str) -> Result<(), ClientError> {
        self.request(SessionRequest::SendText(text.to_string())).await
    }

    /// Delete a message by id.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.request(SessionRequest::Delete(id.to_string())).await
    }

    /// Re-send a message verbatim.
    pub async fn resend(&self, message: Message) -> Result<(), ClientError> {
        self.request(SessionRequest::Resend(message)).await
    }

    /// Manual reconnect.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        self.request(SessionRequest::Reconnect).await
    }

    /// Tear down the session and stop the runtime.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.request(SessionRequest::Shutdown).await
    }

    /// Latest snapshot. `None` before the first render.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every render.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionSnapshot>> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, ClientError> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|snapshot| snapshot.as_ref().is_some_and(&mut predicate))
            .await
            .map_err(|_| ClientError::SessionClosed)?;

        snapshot.clone().ok_or(ClientError::SessionClosed)
    }

    async fn request(&self, request: SessionRequest) -> Result<(), ClientError> {
        self.requests.send(request).await.map_err(|_| ClientError::SessionClosed)
    }
}

/// Start a session on the current tokio runtime.
///
/// The returned task completes once the session shuts down.
///
/// # Errors
///
/// - `ClientError::InvalidServerUrl` if the configuration is rejected
pub fn spawn(
    config: ClientConfig,
) -> Result<(SessionHandle, JoinHandle<Result<(), ClientError>>), ClientError> {
    config.validate()?;

    let (requests_tx, requests_rx) = mpsc::channel(config.request_buffer.max(1));
    let (snapshots_tx, snapshots_rx) = watch::channel(None);
    let driver = WsDriver::new(&config, requests_rx, snapshots_tx);

    let mut session = Session::new(SystemEnv, config.session());
    if !config.passphrase.is_empty() {
        session.set_passphrase(config.passphrase.clone());
    }

    tracing::info!(
        server = %config.server_url,
        channel = config.channel.as_encoded(),
        participant = session.participant_id(),
        "starting session"
    );

    let task = tokio::spawn(Runtime::with_session(driver, session).run());
    Ok((SessionHandle { requests: requests_tx, snapshots: snapshots_rx }, task))
}
