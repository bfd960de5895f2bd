//! Property-based tests for the message reducer.
//!
//! The reducer is checked against a naive model: a list of `(id, message)`
//! pairs where a put overwrites the first matching id and a delete filters.

use heisenpad_core::{ChatState, reduce};
use heisenpad_proto::{Command, Message};
use proptest::prelude::*;

/// Small id space so puts and deletes collide often.
fn id_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(String::from)
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        1 => Just(Command::Ping),
        4 => (id_strategy(), "[a-z]{0,8}", any::<bool>()).prop_map(|(id, content, encrypted)| {
            Command::Put { message: Message { id, user: "u".into(), content, encrypted } }
        }),
        2 => id_strategy().prop_map(|id| Command::Delete { id }),
    ]
}

fn model(commands: &[Command]) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::new();
    for command in commands {
        match command {
            Command::Ping => {},
            Command::Put { message } => {
                if let Some(slot) = messages.iter_mut().find(|m| m.id == message.id) {
                    *slot = message.clone();
                } else {
                    messages.push(message.clone());
                }
            },
            Command::Delete { id } => messages.retain(|m| &m.id != id),
        }
    }
    messages
}

proptest! {
    #[test]
    fn prop_matches_model(commands in prop::collection::vec(command_strategy(), 0..64)) {
        let state = commands.iter().fold(ChatState::new(), reduce);
        let expected = model(&commands);
        prop_assert_eq!(state.messages(), expected.as_slice());
    }

    #[test]
    fn prop_ids_stay_unique(commands in prop::collection::vec(command_strategy(), 0..64)) {
        let state = commands.iter().fold(ChatState::new(), reduce);
        let mut ids: Vec<&str> = state.messages().iter().map(|m| m.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }

    #[test]
    fn prop_reapplying_last_command_is_idempotent(
        commands in prop::collection::vec(command_strategy(), 1..32),
    ) {
        let state = commands.iter().fold(ChatState::new(), reduce);
        let Some(last) = commands.last() else { unreachable!() };

        let mut again = state.clone();
        prop_assert!(!again.apply(last));
        prop_assert_eq!(again, state);
    }

    #[test]
    fn prop_ping_never_changes_state(commands in prop::collection::vec(command_strategy(), 0..32)) {
        let state = commands.iter().fold(ChatState::new(), reduce);
        prop_assert_eq!(reduce(state.clone(), &Command::Ping), state);
    }

    #[test]
    fn prop_surviving_order_is_stable(
        commands in prop::collection::vec(command_strategy(), 0..32),
        tail in prop::collection::vec(command_strategy(), 0..32),
    ) {
        // Messages present both before and after the tail keep their relative order
        let before = commands.iter().fold(ChatState::new(), reduce);
        let after = tail.iter().fold(before.clone(), reduce);

        let positions: Vec<usize> = before
            .messages()
            .iter()
            .filter_map(|m| after.messages().iter().position(|n| n.id == m.id))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
