// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The "one reader, orphan carry-forward" interruptible-read contract
//! (§4.4, §9 Design Notes), shared by the Telnet and SSH endpoints.
//!
//! At most one read may be in flight against the underlying stream at a
//! time. `read` first drains any bytes a previous, interrupted read had
//! already pulled off the wire (`pending`), then checks whether an
//! earlier read is still outstanding (`orphan`) and waits on it before
//! issuing a fresh one. An interrupted read is never abandoned — its
//! result is retained and served to the caller of the next `read`.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Outcome of one [`InterruptibleRead::read`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(usize),
    Eof,
    Interrupted,
}

type OrphanHandle<R> = JoinHandle<std::io::Result<(R, Vec<u8>, usize)>>;

/// Wraps a raw `AsyncRead` with the orphan-carry-forward discipline.
pub struct InterruptibleRead<R> {
    reader: Option<R>,
    pending: Vec<u8>,
    orphan: Option<OrphanHandle<R>>,
    interrupt: Arc<Notify>,
}

impl<R> InterruptibleRead<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            pending: Vec::new(),
            orphan: None,
            interrupt: Arc::new(Notify::new()),
        }
    }

    /// The interrupt handle; call `.notify_one()` on it to abort the
    /// current or next read.
    pub fn interrupt_handle(&self) -> Arc<Notify> {
        self.interrupt.clone()
    }

    pub fn set_interrupt(&mut self, interrupt: Arc<Notify>) {
        self.interrupt = interrupt;
    }

    /// Read into `buf`. Never consumes bytes it does not return: an
    /// interrupted read keeps its in-flight task alive (or its already-
    /// pulled bytes buffered) so nothing is lost.
    pub async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<ReadOutcome> {
        if !self.pending.is_empty() {
            let n = self.pending.len().min(buf.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            return Ok(ReadOutcome::Data(n));
        }

        let handle = match self.orphan.take() {
            Some(handle) => handle,
            None => self.spawn_read(buf.len())?,
        };

        tokio::select! {
            biased;
            _ = self.interrupt.notified() => {
                self.orphan = Some(handle);
                Ok(ReadOutcome::Interrupted)
            }
            joined = handle => {
                self.finish(joined, buf)
            }
        }
    }

    fn spawn_read(&mut self, want: usize) -> std::io::Result<OrphanHandle<R>> {
        let Some(mut reader) = self.reader.take() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "reader taken by a concurrent read",
            ));
        };
        let cap = want.max(1);
        Ok(tokio::spawn(async move {
            let mut scratch = vec![0u8; cap];
            let n = reader.read(&mut scratch).await?;
            scratch.truncate(n);
            Ok((reader, scratch, n))
        }))
    }

    fn finish(
        &mut self,
        joined: Result<std::io::Result<(R, Vec<u8>, usize)>, tokio::task::JoinError>,
        buf: &mut [u8],
    ) -> std::io::Result<ReadOutcome> {
        let (reader, bytes, n) = joined
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;
        self.reader = Some(reader);
        if n == 0 {
            return Ok(ReadOutcome::Eof);
        }
        let copy_len = n.min(buf.len());
        buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
        if copy_len < n {
            self.pending.extend_from_slice(&bytes[copy_len..n]);
        }
        Ok(ReadOutcome::Data(copy_len))
    }
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
