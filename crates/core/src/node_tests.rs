// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

#[test]
fn assigns_smallest_free_slot() {
    let registry = NodeRegistry::new(4);
    assert_eq!(registry.assign(), 1);
    assert_eq!(registry.assign(), 2);
    registry.release(1);
    assert_eq!(registry.assign(), 1);
    assert_eq!(registry.assign(), 3);
}

#[test]
fn release_is_idempotent() {
    let registry = NodeRegistry::new(2);
    let slot = registry.assign();
    registry.release(slot);
    registry.release(slot);
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn overflows_to_monotonic_counter_when_full() {
    let registry = NodeRegistry::new(1);
    assert_eq!(registry.assign(), 1);
    let overflow = registry.assign();
    assert!(overflow > 1);
    let overflow2 = registry.assign();
    assert!(overflow2 > overflow);
}

#[test]
fn zero_max_nodes_always_overflows() {
    let registry = NodeRegistry::new(0);
    let a = registry.assign();
    let b = registry.assign();
    assert_ne!(a, b);
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Assign,
    Release(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Assign), (0..8usize).prop_map(Op::Release)]
}

proptest! {
    #[test]
    fn at_most_k_distinct_slots_live_and_smallest_free_is_used(
        ops in prop::collection::vec(op_strategy(), 1..200)
    ) {
        const K: u32 = 6;
        let registry = NodeRegistry::new(K);
        let mut live: Vec<u32> = Vec::new();

        for op in ops {
            match op {
                Op::Assign => {
                    let slot = registry.assign();
                    if slot <= K {
                        let expected_smallest = (1..=K).find(|s| !live.contains(s));
                        prop_assert_eq!(Some(slot), expected_smallest);
                    }
                    live.push(slot);
                }
                Op::Release(idx) => {
                    if !live.is_empty() {
                        let slot = live.remove(idx % live.len());
                        registry.release(slot);
                    }
                }
            }
            let bounded_live: Vec<_> = live.iter().filter(|s| **s <= K).collect();
            prop_assert!(bounded_live.len() <= K as usize);
        }
    }
}
