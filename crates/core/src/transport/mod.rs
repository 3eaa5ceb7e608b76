// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport polymorphism (C5, §9 Design Notes): a single capability set
//! both the Telnet and SSH endpoints implement, so the menu executor
//! never needs to know which transport it is driving.

pub mod interrupt;
pub mod ssh;
pub mod telnet;

pub use interrupt::{InterruptibleRead, ReadOutcome};

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::session::SessionContext;

/// Negotiated PTY information. Telnet always synthesizes one with
/// `term = "ansi"` unless a terminal-type was negotiated.
#[derive(Debug, Clone)]
pub struct PtyInfo {
    pub term: String,
    pub width: u16,
    pub height: u16,
}

/// The capability set every transport-level session exposes to the rest
/// of the core. `{Read, Write, Close, RemoteAddr, LocalAddr, Pty,
/// WindowChanges, SessionId, User, Context, SetReadInterrupt}`.
#[async_trait]
pub trait TransportSession: Send + Sync {
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<ReadOutcome>;
    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;
    async fn close(&mut self);

    fn remote_addr(&self) -> SocketAddr;
    fn local_addr(&self) -> SocketAddr;
    fn session_id(&self) -> &str;

    /// Empty for Telnet; the SSH-authenticated username when the
    /// transport itself performed auth (it does not — see §4.8 — but the
    /// field is still carried for fingerprinting/logging).
    fn user(&self) -> &str;

    fn pty(&self) -> Option<PtyInfo>;
    fn window_change_rx(&mut self) -> &mut tokio::sync::mpsc::Receiver<(u16, u16)>;

    /// Arm the interruptible-read contract: the next (or in-flight) read
    /// resolves to `ReadOutcome::Interrupted` once `interrupt` fires.
    fn set_read_interrupt(&mut self, interrupt: Arc<tokio::sync::Notify>);

    fn context(&self) -> &Arc<SessionContext>;
}
