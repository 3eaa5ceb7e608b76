// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unified error kinds surfaced by the core (see spec §7).
//!
//! `anyhow` is used at call sites that only need to propagate and log;
//! this type is for the handful of places a caller matches on the kind.

use std::path::PathBuf;
use std::time::Duration;

/// Error kinds surfaced by the core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection rejected: {reason}")]
    AdmissionRejected { reason: String },

    #[error("telnet negotiation failed")]
    NegotiationFailed,

    #[error("ssh handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("account locked out, try again in {remaining:?}")]
    AuthLockedOut { remaining: Duration },

    #[error("terminal size probe timed out")]
    TerminalProbeTimeout,

    #[error("read interrupted")]
    ReadInterrupted,

    #[error("session disconnected")]
    Disconnect,

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("ssh host key missing or unparseable at {0}")]
    HostKeyMissing(PathBuf),

    #[error("menu execution error: {0}")]
    MenuExecError(String),
}

impl Error {
    /// Whether this error represents end-of-stream / interruption rather
    /// than a hard failure — callers use this to decide whether to log
    /// at `warn` or treat the session as a clean disconnect.
    pub fn is_benign_disconnect(&self) -> bool {
        matches!(self, Error::ReadInterrupted | Error::Disconnect)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
