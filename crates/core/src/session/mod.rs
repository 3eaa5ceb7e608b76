// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session data (§3): the per-connection state mutated by the menu
//! executor across transitions and resize events.

mod context;
pub mod terminal;

pub use context::SessionContext;
pub use terminal::TerminalState;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::outputmode::OutputMode;

/// One live interactive connection, from successful admission to close.
pub struct Session {
    pub node_slot: u32,
    pub remote_addr: SocketAddr,
    pub started_at: Instant,
    last_activity: Mutex<Instant>,
    current_menu: Mutex<String>,
    pub output_mode: Mutex<OutputMode>,
    pub terminal: Arc<TerminalState>,
    pub user: Mutex<Option<String>>,
    pub invisible: Mutex<bool>,
    pub cancellation: CancellationToken,
    pub context: Arc<SessionContext>,
}

impl Session {
    pub fn new(
        node_slot: u32,
        remote_addr: SocketAddr,
        output_mode: OutputMode,
        terminal: Arc<TerminalState>,
        context: Arc<SessionContext>,
    ) -> Self {
        let now = Instant::now();
        Self {
            node_slot,
            remote_addr,
            started_at: now,
            last_activity: Mutex::new(now),
            current_menu: Mutex::new(String::new()),
            output_mode: Mutex::new(output_mode),
            terminal,
            user: Mutex::new(None),
            invisible: Mutex::new(false),
            cancellation: CancellationToken::new(),
            context,
        }
    }

    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock()
    }

    pub fn current_menu(&self) -> String {
        self.current_menu.lock().clone()
    }

    pub fn set_current_menu(&self, name: impl Into<String>) {
        *self.current_menu.lock() = name.into();
    }

    pub fn username(&self) -> Option<String> {
        self.user.lock().clone()
    }

    pub fn set_user(&self, username: impl Into<String>) {
        *self.user.lock() = Some(username.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.lock().is_some()
    }

    pub fn set_invisible(&self, invisible: bool) {
        *self.invisible.lock() = invisible;
    }

    pub fn is_invisible(&self) -> bool {
        *self.invisible.lock()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
