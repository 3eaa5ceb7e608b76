// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal State: current size plus a bounded resize-event channel.

use std::sync::atomic::{AtomicU16, Ordering};

use tokio::sync::mpsc;

/// Telnet's window cap, retained from the source implementation for
/// compatibility with retro clients that misreport larger sizes.
pub const MAX_WIDTH: u16 = 80;
pub const MAX_HEIGHT: u16 = 25;

const DEFAULT_WIDTH: u16 = 80;
const DEFAULT_HEIGHT: u16 = 25;

/// Current terminal dimensions, updated by resize events and read by
/// any task without locking.
pub struct TerminalState {
    width: AtomicU16,
    height: AtomicU16,
    resize_tx: mpsc::Sender<(u16, u16)>,
}

impl TerminalState {
    /// Returns the state plus the receiving half of its resize channel.
    /// The channel holds a single slot; a resize-forwarder task is
    /// expected to drain it and call [`Self::set`].
    pub fn new() -> (std::sync::Arc<Self>, mpsc::Receiver<(u16, u16)>) {
        let (resize_tx, resize_rx) = mpsc::channel(1);
        let state = std::sync::Arc::new(Self {
            width: AtomicU16::new(DEFAULT_WIDTH),
            height: AtomicU16::new(DEFAULT_HEIGHT),
            resize_tx,
        });
        (state, resize_rx)
    }

    pub fn width(&self) -> u16 {
        self.width.load(Ordering::Relaxed)
    }

    pub fn height(&self) -> u16 {
        self.height.load(Ordering::Relaxed)
    }

    pub fn set(&self, width: u16, height: u16) {
        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);
    }

    /// Publish a raw detected `(width, height)` pair (clamped to the
    /// Telnet-compatible cap) onto the resize channel, non-blocking.
    /// Readers observe only the latest value; intermediate ones may be
    /// dropped.
    pub fn publish_resize(&self, width: u16, height: u16) {
        let clamped = (clamp_dimension(width, MAX_WIDTH), clamp_dimension(height, MAX_HEIGHT));
        let _ = self.resize_tx.try_send(clamped);
    }
}

/// Clamp a detected dimension to `[1, cap]`, mapping `0` to the default
/// that matches the cap (80 or 25).
fn clamp_dimension(value: u16, cap: u16) -> u16 {
    if value == 0 {
        cap
    } else {
        value.min(cap)
    }
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
