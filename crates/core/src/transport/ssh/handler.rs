// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `russh::server::Handler` implementation (§4.4): channel request
//! handling. Pty/window/env/shell/exec are accepted; anything else is
//! politely refused. All decoded channel data and window-change events
//! are forwarded over plain `mpsc` channels to the [`super::SshSession`]
//! half of the bridge, which is what the rest of the core actually talks
//! to.

use std::collections::HashMap;
use std::net::SocketAddr;

use russh::server::{Auth, Msg, Session};
use russh::{Channel, ChannelId};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Sent once from the handler to the accept loop when a channel becomes
/// ready to drive (a `shell` or `exec` request arrived). Carries
/// everything [`super::SshSession`] needs to construct itself.
pub struct ChannelReady {
    pub channel_id: ChannelId,
    pub handle: russh::server::Handle,
    pub username: Option<String>,
    pub term: String,
    pub width: u16,
    pub height: u16,
    pub env: HashMap<String, String>,
    pub data_rx: mpsc::Receiver<Vec<u8>>,
    pub resize_rx: mpsc::Receiver<(u16, u16)>,
}

pub struct BbsHandler {
    pub remote_addr: SocketAddr,
    pub username: Option<String>,
    term: String,
    width: u16,
    height: u16,
    env: HashMap<String, String>,
    data_tx: Option<mpsc::Sender<Vec<u8>>>,
    resize_tx: Option<mpsc::Sender<(u16, u16)>>,
    ready_tx: Option<oneshot::Sender<ChannelReady>>,
    ready_channel: Option<ChannelId>,
}

impl BbsHandler {
    pub fn new(remote_addr: SocketAddr, ready_tx: oneshot::Sender<ChannelReady>) -> Self {
        Self {
            remote_addr,
            username: None,
            term: "ansi".to_owned(),
            width: 80,
            height: 25,
            env: HashMap::new(),
            data_tx: None,
            resize_tx: None,
            ready_tx: Some(ready_tx),
            ready_channel: None,
        }
    }

    fn signal_ready(&mut self, channel_id: ChannelId, handle: russh::server::Handle) {
        if self.ready_channel.is_some() {
            return;
        }
        self.ready_channel = Some(channel_id);
        let (data_tx, data_rx) = mpsc::channel(256);
        let (resize_tx, resize_rx) = mpsc::channel(1);
        self.data_tx = Some(data_tx);
        self.resize_tx = Some(resize_tx);
        if let Some(tx) = self.ready_tx.take() {
            let _ = tx.send(ChannelReady {
                channel_id,
                handle,
                username: self.username.clone(),
                term: self.term.clone(),
                width: self.width,
                height: self.height,
                env: self.env.clone(),
                data_rx,
                resize_rx,
            });
        }
    }
}

#[async_trait::async_trait]
impl russh::server::Handler for BbsHandler {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, _password: &str) -> Result<Auth, Self::Error> {
        // The BBS authenticates in-band via the menu layer (§4.8); the
        // transport only needs *a* username to route auto-authenticated
        // sessions, not to authorize them.
        self.username = Some(user.to_owned());
        Ok(Auth::Accept)
    }

    async fn auth_publickey(
        &mut self,
        user: &str,
        _key: &russh::keys::ssh_key::PublicKey,
    ) -> Result<Auth, Self::Error> {
        // Public key is accepted but ignored for authorization, per §4.4.
        self.username = Some(user.to_owned());
        Ok(Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        _channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        _channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.term = term.to_lowercase();
        self.width = col_width.min(u16::MAX as u32) as u16;
        self.height = row_height.min(u16::MAX as u32) as u16;
        Ok(())
    }

    async fn window_change_request(
        &mut self,
        _channel: ChannelId,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        let width = col_width.min(u16::MAX as u32) as u16;
        let height = row_height.min(u16::MAX as u32) as u16;
        if let Some(tx) = &self.resize_tx {
            let _ = tx.try_send((width, height));
        }
        Ok(())
    }

    async fn env_request(
        &mut self,
        _channel: ChannelId,
        variable_name: &str,
        variable_value: &str,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.env.insert(variable_name.to_owned(), variable_value.to_owned());
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.signal_ready(channel, session.handle());
        session.channel_success(channel)?;
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        _data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        // Door-program exec is an external collaborator concern (§1 out
        // of scope); accept the channel so the menu layer can decide,
        // but do not special-case the command string here.
        self.signal_ready(channel, session.handle());
        session.channel_success(channel)?;
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        if Some(channel) == self.ready_channel {
            if let Some(tx) = &self.data_tx {
                // Backpressure instead of silent drop (§7): a full channel
                // means the session loop is behind, not that this input
                // should be lost.
                let _ = tx.send(data.to_vec()).await;
            }
        }
        Ok(())
    }

    async fn channel_close(
        &mut self,
        _channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        info!("ssh channel closed from {}", self.remote_addr);
        Ok(())
    }
}

/// Refuse any channel request kind this endpoint does not implement, by
/// simply not responding with success — `russh` reports failure to the
/// client for unacknowledged requests. Named here for discoverability;
/// the refusal itself is the absence of a handler override above.
pub fn log_unsupported_request(remote_addr: SocketAddr, kind: &str) {
    warn!("ssh {remote_addr}: refusing unsupported channel request {kind}");
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
