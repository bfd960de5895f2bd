//! Observers on one relay converge when they see the same arrival order.

use heisenpad_harness::SimCluster;
use heisenpad_proto::Message;
use proptest::prelude::*;

const CLIENTS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Send { client: usize, text: String },
    Edit { client: usize, index: usize, text: String },
    Delete { client: usize, index: usize },
    Deliver { count: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..CLIENTS, "[a-z ]{1,12}").prop_map(|(client, text)| Op::Send { client, text }),
        2 => (0..CLIENTS, 0..8usize, "[a-z ]{1,12}")
            .prop_map(|(client, index, text)| Op::Edit { client, index, text }),
        2 => (0..CLIENTS, 0..8usize).prop_map(|(client, index)| Op::Delete { client, index }),
        3 => (0..6usize).prop_map(|count| Op::Deliver { count }),
    ]
}

fn apply(cluster: &mut SimCluster, op: Op) {
    match op {
        Op::Send { client, text } => cluster.submit(client, |s| s.send_text(&text)),
        Op::Edit { client, index, text } => {
            let Some(original) = cluster.session(client).chat().messages().get(index).cloned() else {
                return;
            };
            let edited = Message { content: text, ..original };
            cluster.submit(client, |s| s.resend(&edited));
        },
        Op::Delete { client, index } => {
            let Some(id) = cluster.session(client).chat().messages().get(index).map(|m| m.id.clone())
            else {
                return;
            };
            cluster.submit(client, |s| s.delete_message(id));
        },
        Op::Deliver { count } => {
            for _ in 0..count {
                cluster.step();
            }
        },
    }
}

proptest! {
    #[test]
    fn prop_single_relay_converges(seed in any::<u64>(), ops in prop::collection::vec(op(), 0..40)) {
        let mut cluster = SimCluster::new(seed, CLIENTS);
        for op in ops {
            apply(&mut cluster, op);
        }
        cluster.deliver_all();

        let reference = cluster.session(0).chat().clone();
        for client in 1..CLIENTS {
            prop_assert_eq!(cluster.session(client).chat(), &reference);
        }
    }

    #[test]
    fn prop_runs_are_reproducible(seed in any::<u64>(), ops in prop::collection::vec(op(), 0..30)) {
        let run = |ops: Vec<Op>| {
            let mut cluster = SimCluster::new(seed, CLIENTS);
            for op in ops {
                apply(&mut cluster, op);
            }
            cluster.deliver_all();
            (0..CLIENTS).map(|c| cluster.session(c).chat().clone()).collect::<Vec<_>>()
        };

        prop_assert_eq!(run(ops.clone()), run(ops));
    }
}
