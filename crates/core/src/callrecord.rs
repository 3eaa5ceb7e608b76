// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Call record emission on disconnect (§7 `Disconnect` policy: "Emit
//! call record (if user authenticated), decrement admission, release
//! node slot, run close"). The record format is this core's own —
//! §6 only specifies the IP-list ban-line format, not call records —
//! so a simple one-line-per-call append is used, matching the
//! line-oriented style §6 already uses for ban entries.

use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::io::AsyncWriteExt;
use tracing::warn;

/// One completed (or abandoned) session, ready to append to the node
/// record log.
pub struct CallRecord {
    pub node_slot: u32,
    pub remote_addr: SocketAddr,
    pub username: Option<String>,
    pub invisible: bool,
    pub connected_at: SystemTime,
    pub duration: Duration,
}

impl CallRecord {
    /// `<timestamp> node=<n> ip=<addr> user=<name|-> invisible=<bool> duration=<secs>s`
    fn to_line(&self) -> String {
        let timestamp = self
            .connected_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let user = self.username.as_deref().unwrap_or("-");
        format!(
            "{timestamp} node={} ip={} user={user} invisible={} duration={}s\n",
            self.node_slot,
            self.remote_addr.ip(),
            self.invisible,
            self.duration.as_secs(),
        )
    }
}

/// Appends call records to a single log file. Invisible sessions still
/// emit a record (§4.8: invisible only affects who's-online visibility,
/// not accounting), but the caller decides whether to emit at all — per
/// §7, a call record is only emitted when the user authenticated.
pub struct CallRecordLog {
    path: std::path::PathBuf,
}

impl CallRecordLog {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn append(&self, record: &CallRecord) {
        if let Err(e) = self.try_append(record).await {
            warn!("failed to append call record to {}: {e}", self.path.display());
        }
    }

    async fn try_append(&self, record: &CallRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(record.to_line().as_bytes()).await
    }
}

pub fn default_path() -> &'static Path {
    Path::new("data/callers.log")
}

#[cfg(test)]
#[path = "callrecord_tests.rs"]
mod tests;
