// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH Endpoint (C4, §4.4): host key loading, algorithm policy, channel
//! bridging. `russh`'s data delivery is callback-driven rather than a
//! plain `AsyncRead`, so this transport carries its own orphan-carry
//! read loop over an `mpsc` channel instead of reusing
//! [`super::InterruptibleRead`] directly — the contract (never drop
//! bytes already pulled off the wire across an interrupt) is the same,
//! only the source of bytes differs.

mod algorithms;
mod handler;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::server::Config;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::warn;

use crate::error::Error;
use crate::session::{SessionContext, TerminalState};
use crate::transport::{PtyInfo, ReadOutcome, TransportSession};

const READY_DEADLINE: Duration = Duration::from_secs(30);

/// Loads the host key and algorithm policy once at startup; each
/// accepted connection gets its own [`handler::BbsHandler`] driven by
/// `russh` against a clone of the shared `Config`.
pub struct SshEndpoint {
    config: Arc<Config>,
}

impl SshEndpoint {
    pub fn load(host_key_path: &Path, legacy_algorithms: bool) -> Result<Self, Error> {
        let key_bytes = std::fs::read(host_key_path)
            .map_err(|_| Error::HostKeyMissing(host_key_path.to_path_buf()))?;
        let key_pair = russh::keys::PrivateKey::from_openssh(&key_bytes)
            .map_err(|_| Error::HostKeyMissing(host_key_path.to_path_buf()))?;

        let config = Config {
            keys: vec![key_pair],
            preferred: algorithms::select(legacy_algorithms),
            ..Default::default()
        };

        Ok(Self { config: Arc::new(config) })
    }

    /// Drive the SSH handshake, authentication, and channel setup on a
    /// freshly admitted connection, returning a ready [`SshSession`] once
    /// a `shell` or `exec` request arrives (or an error on timeout or
    /// handshake failure).
    pub async fn accept(
        &self,
        stream: TcpStream,
        remote_addr: SocketAddr,
        local_addr: SocketAddr,
        server_banner: String,
    ) -> Result<SshSession, Error> {
        stream.set_nodelay(true).ok();

        let (ready_tx, ready_rx) = oneshot::channel();
        let bbs_handler = handler::BbsHandler::new(remote_addr, ready_tx);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = russh::server::run_stream(config, stream, bbs_handler).await {
                warn!("ssh session from {remote_addr} ended: {e}");
            }
        });

        let ready = tokio::time::timeout(READY_DEADLINE, ready_rx)
            .await
            .map_err(|_| Error::HandshakeFailed("no shell/exec request within deadline".into()))?
            .map_err(|_| Error::HandshakeFailed("handler dropped before channel was ready".into()))?;

        let (terminal, _terminal_resize_rx) = TerminalState::new();
        terminal.set(ready.width, ready.height);
        let context = Arc::new(SessionContext::new(remote_addr, local_addr, server_banner));

        Ok(SshSession {
            handle: ready.handle,
            channel_id: ready.channel_id,
            reader: ChannelReader::new(ready.data_rx),
            resize_rx: ready.resize_rx,
            remote_addr,
            local_addr,
            username: ready.username,
            term: ready.term,
            terminal,
            context,
        })
    }
}

/// The orphan-carry read discipline (§4.4, §9 Design Notes) applied to
/// `russh`'s channel-data channel instead of a raw socket. Unlike
/// [`super::InterruptibleRead`], nothing needs to be spawned: `data_rx`
/// is itself a buffered channel, so an interrupted `recv()` future can
/// simply be dropped by `select!` without losing whatever the handler
/// has already pushed into it — the next call picks the same message
/// back up.
pub struct ChannelReader {
    data_rx: mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
    interrupt: Arc<Notify>,
}

impl ChannelReader {
    fn new(data_rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { data_rx, pending: Vec::new(), interrupt: Arc::new(Notify::new()) }
    }

    fn set_interrupt(&mut self, interrupt: Arc<Notify>) {
        self.interrupt = interrupt;
    }

    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<ReadOutcome> {
        if !self.pending.is_empty() {
            let n = self.pending.len().min(buf.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            return Ok(ReadOutcome::Data(n));
        }

        tokio::select! {
            biased;
            _ = self.interrupt.notified() => Ok(ReadOutcome::Interrupted),
            maybe = self.data_rx.recv() => {
                match maybe {
                    None => Ok(ReadOutcome::Eof),
                    Some(bytes) => {
                        let copy_len = bytes.len().min(buf.len());
                        buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
                        if copy_len < bytes.len() {
                            self.pending.extend_from_slice(&bytes[copy_len..]);
                        }
                        Ok(ReadOutcome::Data(copy_len))
                    }
                }
            }
        }
    }
}

/// A live SSH channel, bridged from `russh`'s callback-driven delivery
/// into the [`TransportSession`] capability set.
pub struct SshSession {
    handle: russh::server::Handle,
    channel_id: russh::ChannelId,
    reader: ChannelReader,
    resize_rx: mpsc::Receiver<(u16, u16)>,
    remote_addr: SocketAddr,
    local_addr: SocketAddr,
    username: Option<String>,
    term: String,
    terminal: Arc<TerminalState>,
    context: Arc<SessionContext>,
}

#[async_trait]
impl TransportSession for SshSession {
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<ReadOutcome> {
        // Pick up an outstanding resize first, so it is never starved by
        // a continuously-busy data channel.
        if let Ok((w, h)) = self.resize_rx.try_recv() {
            self.terminal.publish_resize(w, h);
        }

        self.reader.read(buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.handle
            .data(self.channel_id, buf.to_vec().into())
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "ssh channel closed"))
    }

    async fn close(&mut self) {
        let _ = self.handle.close(self.channel_id).await;
    }

    fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn session_id(&self) -> &str {
        &self.context.session_id
    }

    fn user(&self) -> &str {
        // Set from whatever username the client offered during auth
        // (§4.4); the menu layer decides whether that identity is trusted
        // enough for auto-authentication routing (§4.8).
        self.username.as_deref().unwrap_or("")
    }

    fn pty(&self) -> Option<PtyInfo> {
        Some(PtyInfo { term: self.term.clone(), width: self.terminal.width(), height: self.terminal.height() })
    }

    fn window_change_rx(&mut self) -> &mut mpsc::Receiver<(u16, u16)> {
        &mut self.resize_rx
    }

    fn set_read_interrupt(&mut self, interrupt: Arc<Notify>) {
        self.reader.set_interrupt(interrupt);
    }

    fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
