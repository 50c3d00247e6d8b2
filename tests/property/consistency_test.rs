// tests/property/consistency_test.rs

//! Property-based tests for registry consistency
//! Random sequences of connects, opens, joins, relays and disconnects must keep
//! partner links symmetric and never leave codes owned by departed hosts.

use crate::test_helpers::{FakePeer, register_peer};
use proptest::prelude::*;
use std::collections::HashMap;
use uniclip::config::Config;
use uniclip::core::lifecycle::disconnect;
use uniclip::core::pairing::PairingCoordinator;
use uniclip::core::protocol::ServerMessage;
use uniclip::core::relay::RelayEngine;
use uniclip::core::state::ServerState;

#[derive(Debug, Clone)]
enum Op {
    Connect,
    Open(usize),
    Join(usize, usize),
    Relay(usize),
    Disconnect(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Connect),
        2 => any::<usize>().prop_map(Op::Open),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Join(a, b)),
        2 => any::<usize>().prop_map(Op::Relay),
        1 => any::<usize>().prop_map(Op::Disconnect),
    ]
}

fn check_invariants(state: &ServerState, live: &[FakePeer]) {
    let snapshot = state.registry.snapshot();
    assert_eq!(snapshot.len(), live.len());

    let partners: HashMap<u64, Option<u64>> =
        snapshot.iter().map(|c| (c.id, c.partner_id)).collect();
    for (id, partner) in &partners {
        if let Some(p) = partner {
            assert_ne!(p, id, "connection {id} is its own partner");
            assert_eq!(
                partners.get(p).copied().flatten(),
                Some(*id),
                "link {id} -> {p} is not symmetric"
            );
        }
    }
    let bound = partners.values().filter(|p| p.is_some()).count();
    assert_eq!(state.registry.room_count() * 2, bound);

    let held: usize = live
        .iter()
        .map(|peer| state.registry.codes_held_by(peer.id).len())
        .sum();
    assert_eq!(held, state.registry.outstanding_codes());
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_registry_stays_consistent(ops in prop::collection::vec(op_strategy(), 1..=80)) {
        let state = ServerState::new(Config::default());
        let mut live: Vec<FakePeer> = Vec::new();
        let mut issued: Vec<String> = Vec::new();

        for op in ops {
            match op {
                Op::Connect => live.push(register_peer(&state)),
                Op::Open(i) if !live.is_empty() => {
                    let host = live[i % live.len()].id;
                    let code = PairingCoordinator::new(&state.registry).open(host).unwrap();
                    issued.push(code);
                }
                Op::Join(i, c) if !live.is_empty() && !issued.is_empty() => {
                    let joiner = live[i % live.len()].id;
                    let code = issued[c % issued.len()].clone();
                    let before = state.registry.partner_of(joiner);
                    match PairingCoordinator::new(&state.registry).join(joiner, &code) {
                        Ok(host) => {
                            prop_assert_eq!(before, None);
                            prop_assert_eq!(state.registry.partner_of(joiner), Some(host));
                        }
                        Err(e) => {
                            prop_assert!(e.is_protocol_error());
                            prop_assert_eq!(state.registry.partner_of(joiner), before);
                        }
                    }
                    // Whatever happened, the code is gone.
                    prop_assert!(!state.registry.has_code(&code));
                }
                Op::Relay(i) if !live.is_empty() => {
                    let from = live[i % live.len()].id;
                    let partner = state.registry.partner_of(from);
                    let outcome = RelayEngine::new(&state.registry).relay(from, "clip".into());
                    prop_assert_eq!(outcome.is_forwarded(), partner.is_some());
                }
                Op::Disconnect(i) if !live.is_empty() => {
                    let mut gone = live.remove(i % live.len());
                    let partner = state.registry.partner_of(gone.id);
                    let report = disconnect(&state.registry, gone.id).unwrap();
                    prop_assert_eq!(report.notified_partner, partner);
                    if let Some(p) = partner {
                        let peer = live.iter_mut().find(|peer| peer.id == p).unwrap();
                        let last = peer.drain().pop();
                        prop_assert_eq!(last, Some(ServerMessage::Disconnected));
                    }
                    gone.drain();
                }
                _ => {}
            }
            // Keep queues from filling up.
            for peer in &mut live {
                peer.drain();
            }
            check_invariants(&state, &live);
        }
    }
}
