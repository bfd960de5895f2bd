//! Runtime orchestration against a scripted driver.

use std::{
    collections::VecDeque,
    convert::Infallible,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Instant,
};

use heisenpad_app::{
    ConnectionState, Driver, DriverInput, Runtime, SessionConfig, SessionEvent, SessionRequest,
    SessionSnapshot,
};
use heisenpad_core::Environment;
use heisenpad_proto::{Channel, Command};

#[derive(Clone, Default)]
struct CountingEnv {
    counter: Arc<AtomicU64>,
}

impl Environment for CountingEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let n = self.counter.fetch_add(1, Ordering::Relaxed).to_le_bytes();
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = n[i % n.len()] ^ (i as u8);
        }
    }
}

/// Replays a fixed input script and records what the runtime asked for.
///
/// Every sent `put`/`delete` is echoed back as the relay would.
#[derive(Default)]
struct ScriptedDriver {
    inputs: VecDeque<DriverInput>,
    connects: Vec<(u64, String)>,
    sent: Vec<(u64, String)>,
    disconnects: Vec<u64>,
    renders: Vec<SessionSnapshot>,
    stopped: Arc<AtomicBool>,
    now: Option<Instant>,
}

impl ScriptedDriver {
    fn new(inputs: impl IntoIterator<Item = DriverInput>) -> Self {
        Self { inputs: inputs.into_iter().collect(), now: Some(Instant::now()), ..Self::default() }
    }
}

impl Driver for ScriptedDriver {
    type Error = Infallible;
    type Instant = Instant;

    async fn next_input(&mut self) -> Result<Option<DriverInput>, Infallible> {
        Ok(self.inputs.pop_front())
    }

    async fn connect(&mut self, generation: u64, url: &str) -> Result<(), Infallible> {
        self.connects.push((generation, url.to_string()));
        self.inputs
            .push_front(DriverInput::Transport(SessionEvent::TransportOpened { generation }));
        Ok(())
    }

    async fn send_frame(&mut self, generation: u64, frame: String) -> Result<(), Infallible> {
        if Command::from_frame(&frame).is_ok_and(|c| c.is_mutation()) {
            self.inputs.push_front(DriverInput::Transport(SessionEvent::FrameReceived {
                generation,
                frame: frame.clone(),
            }));
        }
        self.sent.push((generation, frame));
        Ok(())
    }

    fn disconnect(&mut self, generation: u64) {
        self.disconnects.push(generation);
    }

    fn now(&self) -> Instant {
        self.now.unwrap_or_else(Instant::now)
    }

    fn render(&mut self, snapshot: SessionSnapshot) -> Result<(), Infallible> {
        self.renders.push(snapshot);
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
}

#[test]
fn runtime_connects_sends_and_renders_echo() {
    let driver = ScriptedDriver::new([
        DriverInput::Request(SessionRequest::SendText("hello".into())),
        DriverInput::Request(SessionRequest::SendText("   ".into())),
    ]);
    let mut runtime = Runtime::new(driver, CountingEnv::default(), SessionConfig::default());

    block_on(async {
        runtime.start().await.unwrap();
        while runtime.step().await.unwrap() {}
    });

    let session = runtime.session();
    assert_eq!(session.connection_state(), ConnectionState::Open);
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].body.text(), Some("hello"));

    let driver = runtime.driver();
    assert_eq!(driver.connects, vec![(1, "ws://127.0.0.1:9002/ws/lobby".to_string())]);
    // Immediate keepalive, then the one non-empty message
    assert_eq!(driver.sent.len(), 2);
    assert_eq!(driver.sent[0].1, Command::Ping.to_frame());
    assert_eq!(driver.renders.last().map(|s| s.messages.len()), Some(1));
}

#[test]
fn join_disconnects_previous_generation() {
    let driver = ScriptedDriver::new([
        DriverInput::Request(SessionRequest::SendText("in lobby".into())),
        DriverInput::Request(SessionRequest::Join(Channel::new("elsewhere"))),
    ]);
    let mut runtime = Runtime::new(driver, CountingEnv::default(), SessionConfig::default());

    block_on(async {
        runtime.start().await.unwrap();
        while runtime.step().await.unwrap() {}
    });

    let driver = runtime.driver();
    assert_eq!(driver.disconnects, vec![1]);
    assert_eq!(driver.connects.last().map(|(g, _)| *g), Some(2));
    assert!(runtime.session().messages().is_empty());
    assert_eq!(runtime.session().channel(), &Channel::new("elsewhere"));
}

#[test]
fn shutdown_stops_processing() {
    let driver = ScriptedDriver::new([
        DriverInput::Request(SessionRequest::Shutdown),
        DriverInput::Request(SessionRequest::SendText("never processed".into())),
    ]);
    let mut runtime = Runtime::new(driver, CountingEnv::default(), SessionConfig::default());

    let steps = block_on(async {
        runtime.start().await.unwrap();
        let mut steps = 0;
        while runtime.step().await.unwrap() {
            steps += 1;
        }
        steps
    });

    // TransportOpened is processed, then Shutdown ends the loop
    assert_eq!(steps, 1);
    assert_eq!(runtime.driver().disconnects, vec![1]);
    assert!(runtime.driver().sent.iter().all(|(_, f)| !f.contains("never processed")));
}

#[test]
fn run_stops_driver() {
    let driver = ScriptedDriver::new([DriverInput::Tick]);
    let stopped = Arc::clone(&driver.stopped);
    let runtime = Runtime::new(driver, CountingEnv::default(), SessionConfig::default());

    block_on(runtime.run()).unwrap();
    assert!(stopped.load(Ordering::SeqCst));
}
