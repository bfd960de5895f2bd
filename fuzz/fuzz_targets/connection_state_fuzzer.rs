//! Fuzz target for the connection state machine
//!
//! Drives a connection with arbitrary transport events and time steps.
//!
//! # Invariants
//!
//! - Frames are only emitted while open
//! - Automatic attempts never exceed the configured budget
//! - Only `connect` leaves `Closed`

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use heisenpad_core::{Connection, ConnectionAction, ConnectionConfig, ConnectionState};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Connect,
    Opened,
    Closed,
    Close,
    Tick { millis: u16 },
}

fuzz_target!(|ops: Vec<Op>| {
    let config = ConnectionConfig::default();
    let budget = config.max_reconnect_attempts;
    let mut conn = Connection::new("ws://fuzz/ws/lobby", config);
    let mut now = Instant::now();

    for op in ops {
        let before = conn.state();
        let is_connect = matches!(op, Op::Connect);
        let actions = match op {
            Op::Connect => conn.connect().unwrap_or_default(),
            Op::Opened => conn.handle_open(now),
            Op::Closed => conn.handle_close(now, "fuzz"),
            Op::Close => conn.close(),
            Op::Tick { millis } => {
                now += Duration::from_millis(u64::from(millis));
                conn.tick(now)
            },
        };

        for action in &actions {
            if matches!(action, ConnectionAction::SendFrame(_)) {
                assert_eq!(conn.state(), ConnectionState::Open);
            }
        }

        assert!(conn.reconnect_attempts() <= budget);

        if before == ConnectionState::Closed && !is_connect {
            assert_eq!(conn.state(), ConnectionState::Closed);
        }
    }
});
