// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node Registry (C7): smallest-free-slot assignment in `[1..maxNodes]`.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::warn;

struct Inner {
    held: HashSet<u32>,
    overflow_counter: u32,
}

/// Assigns one integer "node slot" per session. Cheap to clone (wraps an
/// `Arc`) so every accept loop can share a single registry.
#[derive(Clone)]
pub struct NodeRegistry {
    inner: std::sync::Arc<Mutex<Inner>>,
    max_nodes: u32,
}

impl NodeRegistry {
    pub fn new(max_nodes: u32) -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(Inner {
                held: HashSet::new(),
                overflow_counter: max_nodes,
            })),
            max_nodes,
        }
    }

    /// Assign the smallest slot in `[1..maxNodes]` not currently held. If
    /// `maxNodes == 0` or every slot is occupied, falls back to a
    /// monotonically increasing counter — the session is tracked but
    /// unnumbered for capacity purposes.
    pub fn assign(&self) -> u32 {
        let mut inner = self.inner.lock();

        if self.max_nodes > 0 {
            for slot in 1..=self.max_nodes {
                if !inner.held.contains(&slot) {
                    inner.held.insert(slot);
                    return slot;
                }
            }
            warn!("node registry: all {} slots occupied, using overflow slot", self.max_nodes);
        }

        inner.overflow_counter += 1;
        let slot = inner.overflow_counter;
        inner.held.insert(slot);
        slot
    }

    /// Release a previously assigned slot. Idempotent.
    pub fn release(&self, slot: u32) {
        self.inner.lock().held.remove(&slot);
    }

    #[cfg(test)]
    fn live_count(&self) -> usize {
        self.inner.lock().held.len()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
