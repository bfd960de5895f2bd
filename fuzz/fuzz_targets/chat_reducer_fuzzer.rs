//! Fuzz target for the message reducer
//!
//! # Invariants
//!
//! - Ids stay unique
//! - A `put` for a known id keeps its position
//! - Surviving messages keep their relative order
//! - `ping` changes nothing

#![no_main]

use arbitrary::Arbitrary;
use heisenpad_core::ChatState;
use heisenpad_proto::{Command, Message};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Put { id: u8, content: String, encrypted: bool },
    Delete { id: u8 },
    Ping,
}

fn command(op: Op) -> Command {
    match op {
        Op::Put { id, content, encrypted } => Command::Put {
            message: Message { id: format!("m{id}"), user: "fuzz".into(), content, encrypted },
        },
        Op::Delete { id } => Command::Delete { id: format!("m{id}") },
        Op::Ping => Command::Ping,
    }
}

fn ids(state: &ChatState) -> Vec<String> {
    state.messages().iter().map(|m| m.id.clone()).collect()
}

fuzz_target!(|ops: Vec<Op>| {
    let mut state = ChatState::new();

    for op in ops {
        let command = command(op);
        let before = ids(&state);
        let snapshot = state.clone();
        let changed = state.apply(&command);
        let after = ids(&state);

        let mut unique = after.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), after.len(), "duplicate ids");

        match &command {
            Command::Ping => {
                assert!(!changed);
                assert_eq!(state, snapshot);
            },
            Command::Put { message } => {
                if let Some(pos) = before.iter().position(|id| *id == message.id) {
                    assert_eq!(after, before, "put moved a known id");
                    assert_eq!(&state.messages()[pos], message);
                } else {
                    assert_eq!(after.last(), Some(&message.id));
                    assert_eq!(&after[..before.len()], &before[..]);
                }
            },
            Command::Delete { id } => {
                let expected: Vec<String> = before.iter().filter(|b| *b != id).cloned().collect();
                assert_eq!(after, expected);
            },
        }
        assert_eq!(changed, state != snapshot);
    }
});
