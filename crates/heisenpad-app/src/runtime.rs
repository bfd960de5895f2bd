//! Generic runtime for session orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Session`]: pure coordinator state machine
//! - [`Driver`]: platform-specific I/O

use heisenpad_core::Environment;

use crate::{
    Driver, DriverInput, Session, SessionAction, SessionConfig, SessionEvent, SessionRequest,
};

/// Generic runtime that orchestrates a Session through a Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment for ids, nonces and time
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    session: Session<E>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a new runtime with the given driver and environment.
    pub fn new(driver: D, env: E, config: SessionConfig) -> Self {
        Self { driver, session: Session::new(env, config) }
    }

    /// Create a runtime around an existing session.
    pub fn with_session(driver: D, session: Session<E>) -> Self {
        Self { driver, session }
    }

    /// The session being driven.
    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run the main event loop.
    ///
    /// Joins the configured channel, then processes one input at a time
    /// until the driver runs dry or a [`SessionRequest::Shutdown`] arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.start().await?;
        while self.step().await? {}

        self.driver.stop();
        Ok(())
    }

    /// Join the configured channel.
    pub async fn start(&mut self) -> Result<(), D::Error> {
        let actions = self.session.start();
        self.execute(actions).await
    }

    /// Wait for one input and process it.
    ///
    /// Returns `false` once the runtime should stop.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        match self.driver.next_input().await? {
            Some(input) => Ok(!self.process(input).await?),
            None => Ok(false),
        }
    }

    /// Process one input to completion.
    ///
    /// Returns `true` if the runtime should stop.
    pub async fn process(&mut self, input: DriverInput) -> Result<bool, D::Error> {
        let now = self.driver.now();

        let actions = match input {
            DriverInput::Request(SessionRequest::Shutdown) => {
                tracing::info!("shutting down session");
                let actions = self.session.leave();
                self.execute(actions).await?;
                return Ok(true);
            },
            DriverInput::Request(request) => self.handle_request(request),
            DriverInput::Transport(event) => self.session.handle(event, now),
            DriverInput::Tick => self.session.handle(SessionEvent::Tick, now),
        };

        self.execute(actions).await?;
        Ok(false)
    }

    fn handle_request(&mut self, request: SessionRequest) -> Vec<SessionAction> {
        match request {
            SessionRequest::Join(channel) => self.session.join(channel),
            SessionRequest::SetPassphrase(passphrase) => self.session.set_passphrase(passphrase),
            SessionRequest::SendText(text) => self.session.send_text(&text),
            SessionRequest::Delete(id) => self.session.delete_message(id),
            SessionRequest::Resend(message) => self.session.resend(&message),
            SessionRequest::Reconnect => match self.session.reconnect() {
                Ok(actions) => actions,
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring reconnect request");
                    vec![]
                },
            },
            SessionRequest::Shutdown => self.session.leave(),
        }
    }

    /// Execute session actions in order.
    async fn execute(&mut self, actions: Vec<SessionAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                SessionAction::Connect { generation, url } => {
                    self.driver.connect(generation, &url).await?;
                },
                SessionAction::Send { generation, frame } => {
                    self.driver.send_frame(generation, frame).await?;
                },
                SessionAction::Disconnect { generation } => self.driver.disconnect(generation),
                SessionAction::Render => self.driver.render(self.session.snapshot())?,
            }
        }
        Ok(())
    }
}
