// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telnet Endpoint (C3): TCP listener, IAC state machine, negotiation,
//! window detection.

mod codec;
mod negotiate;
mod window;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::debug;

use crate::error::Error;
use crate::session::terminal::{MAX_HEIGHT, MAX_WIDTH};
use crate::session::{SessionContext, TerminalState};
use crate::transport::{InterruptibleRead, PtyInfo, ReadOutcome, TransportSession};

const NEGOTIATION_DRAIN: Duration = Duration::from_millis(500);
const CPR_BUDGET: Duration = Duration::from_secs(3);

pub struct TelnetEndpoint {
    listener: TcpListener,
}

impl TelnetEndpoint {
    pub async fn bind(host: &str, port: u16) -> std::io::Result<Self> {
        let listener = TcpListener::bind((host, port)).await?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }
}

/// Run the negotiation phase and CPR probe on a freshly-accepted,
/// already-admitted connection, producing a ready [`TelnetSession`].
pub async fn negotiate(
    stream: TcpStream,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    server_banner: String,
) -> Result<TelnetSession, Error> {
    stream.set_nodelay(true).ok();
    let (read_half, mut write_half) = stream.into_split();

    write_half
        .write_all(&negotiate::initial_offer())
        .await
        .map_err(|_| Error::NegotiationFailed)?;

    let mut decoder = codec::Decoder::new();
    let mut state = negotiate::Negotiated::default();
    let mut raw = [0u8; 512];

    drain_for(&mut read_half_ref(&read_half), &mut decoder, &mut state, &mut write_half, NEGOTIATION_DRAIN, &mut raw)
        .await;

    let (width, height) = probe_size(&mut read_half_ref(&read_half), &mut decoder, &mut state, &mut write_half)
        .await
        .unwrap_or((MAX_WIDTH, MAX_HEIGHT));

    let (terminal, resize_rx) = TerminalState::new();
    terminal.set(width, height);

    let term = state.term_type.clone().unwrap_or_else(|| "ansi".to_owned());
    let context = Arc::new(SessionContext::new(remote_addr, local_addr, server_banner));

    Ok(TelnetSession {
        interruptible: InterruptibleRead::new(read_half),
        write_half: Mutex::new(write_half),
        decoder,
        pending_data: Vec::new(),
        remote_addr,
        local_addr,
        term,
        terminal,
        resize_rx,
        context,
        interrupt: Arc::new(Notify::new()),
    })
}

/// Placeholder accessor used only to satisfy borrow-checking around the
/// split read half during the handshake, before it is moved into the
/// returned session's `InterruptibleRead`.
fn read_half_ref(read_half: &OwnedReadHalf) -> OwnedReadHalfProxy<'_> {
    OwnedReadHalfProxy(read_half)
}

struct OwnedReadHalfProxy<'a>(&'a OwnedReadHalf);

impl OwnedReadHalfProxy<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.readable().await?;
        // `try_read` avoids needing `&mut` on the shared reference; safe
        // here because the handshake is strictly sequential (no
        // concurrent reader yet).
        loop {
            match self.0.try_read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    self.0.readable().await?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

async fn drain_for(
    read: &mut OwnedReadHalfProxy<'_>,
    decoder: &mut codec::Decoder,
    state: &mut negotiate::Negotiated,
    write_half: &mut OwnedWriteHalf,
    timeout: Duration,
    scratch: &mut [u8],
) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return;
        }
        match tokio::time::timeout(remaining, read.read(scratch)).await {
            Ok(Ok(0)) | Err(_) => return,
            Ok(Ok(n)) => {
                let events = decoder.decode(&scratch[..n]);
                for event in &events {
                    let response = negotiate::handle_event(state, event);
                    if !response.is_empty() && write_half.write_all(&response).await.is_err() {
                        return;
                    }
                }
            }
            Ok(Err(_)) => return,
        }
    }
}

/// Active size probe (§4.3): CPR is authoritative when present, NAWS is
/// the fallback, 80x25 is the last resort.
async fn probe_size(
    read: &mut OwnedReadHalfProxy<'_>,
    decoder: &mut codec::Decoder,
    state: &mut negotiate::Negotiated,
    write_half: &mut OwnedWriteHalf,
) -> Option<(u16, u16)> {
    if write_half.write_all(window::cpr_probe_sequence()).await.is_err() {
        return state.naws;
    }

    let deadline = tokio::time::Instant::now() + CPR_BUDGET;
    let mut accumulated = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        let mut scratch = [0u8; 256];
        match tokio::time::timeout(remaining, read.read(&mut scratch)).await {
            Ok(Ok(0)) | Err(_) => break,
            Ok(Ok(n)) => {
                // Any IAC bytes mixed into the CPR response must still
                // flow through the state machine (§4.3); only the
                // recovered plain-data bytes are scanned for CPR.
                for event in decoder.decode(&scratch[..n]) {
                    if let codec::Event::Data(b) = event {
                        accumulated.push(b);
                    } else {
                        let response = negotiate::handle_event(state, &event);
                        if !response.is_empty() && write_half.write_all(&response).await.is_err() {
                            break;
                        }
                    }
                }
                if let Some(size) = window::parse_cpr(&accumulated) {
                    let _ = write_half.write_all(window::cpr_restore_sequence()).await;
                    return Some(size);
                }
            }
            Ok(Err(_)) => break,
        }
    }

    let _ = write_half.write_all(window::cpr_restore_sequence()).await;
    debug!("CPR probe timed out, falling back to NAWS/default");
    state.naws
}

/// A negotiated, admitted Telnet connection: the concrete
/// [`TransportSession`] implementation for this transport.
pub struct TelnetSession {
    interruptible: InterruptibleRead<OwnedReadHalf>,
    write_half: Mutex<OwnedWriteHalf>,
    decoder: codec::Decoder,
    pending_data: Vec<u8>,
    remote_addr: SocketAddr,
    local_addr: SocketAddr,
    term: String,
    terminal: Arc<TerminalState>,
    resize_rx: mpsc::Receiver<(u16, u16)>,
    context: Arc<SessionContext>,
    interrupt: Arc<Notify>,
}

#[async_trait]
impl TransportSession for TelnetSession {
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<ReadOutcome> {
        if !self.pending_data.is_empty() {
            let n = self.pending_data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.pending_data[..n]);
            self.pending_data.drain(..n);
            return Ok(ReadOutcome::Data(n));
        }

        let mut raw = [0u8; 512];
        loop {
            match self.interruptible.read(&mut raw).await? {
                ReadOutcome::Interrupted => return Ok(ReadOutcome::Interrupted),
                ReadOutcome::Eof => return Ok(ReadOutcome::Eof),
                ReadOutcome::Data(n) => {
                    let mut data_bytes = Vec::new();
                    for event in self.decoder.decode(&raw[..n]) {
                        match event {
                            codec::Event::Data(b) => data_bytes.push(b),
                            codec::Event::Negotiation { .. } => {}
                            codec::Event::Subnegotiation(payload) => {
                                if let [31, rest @ ..] = payload.as_slice() {
                                    let (w, h) = window::parse_naws(rest);
                                    self.terminal.publish_resize(w, h);
                                }
                            }
                        }
                    }
                    if data_bytes.is_empty() {
                        continue;
                    }
                    let copy_len = data_bytes.len().min(buf.len());
                    buf[..copy_len].copy_from_slice(&data_bytes[..copy_len]);
                    if copy_len < data_bytes.len() {
                        self.pending_data.extend_from_slice(&data_bytes[copy_len..]);
                    }
                    return Ok(ReadOutcome::Data(copy_len));
                }
            }
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        let escaped = codec::encode_data(buf);
        self.write_half.lock().await.write_all(&escaped).await
    }

    async fn close(&mut self) {
        let _ = self.write_half.lock().await.shutdown().await;
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
        ""
    }

    fn pty(&self) -> Option<PtyInfo> {
        Some(PtyInfo { term: self.term.clone(), width: self.terminal.width(), height: self.terminal.height() })
    }

    fn window_change_rx(&mut self) -> &mut mpsc::Receiver<(u16, u16)> {
        &mut self.resize_rx
    }

    fn set_read_interrupt(&mut self, interrupt: Arc<Notify>) {
        self.interrupt = interrupt.clone();
        self.interruptible.set_interrupt(interrupt);
    }

    fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
