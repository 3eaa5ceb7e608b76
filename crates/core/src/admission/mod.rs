// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission control: connection counting (C1), IP allow/block lists with
//! hot reload (C2).

mod iplist;
mod state;
mod tracker;

pub use iplist::IpList;
pub use state::{AdmitResult, LockoutStatus};
pub use tracker::{AdmissionPolicy, AdmissionTracker};

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Watches the configured allow/block list files and swaps fresh copies
/// into an [`AdmissionTracker`] on change. A reload that fails to parse
/// (e.g. the file vanished mid-write) retains the previously-loaded list
/// rather than clearing it out from under active admission decisions.
pub struct IpListWatcher {
    allow_path: Option<PathBuf>,
    block_path: Option<PathBuf>,
    tracker: AdmissionTracker,
    debounce: Duration,
}

impl IpListWatcher {
    pub fn new(
        allow_path: Option<PathBuf>,
        block_path: Option<PathBuf>,
        tracker: AdmissionTracker,
    ) -> Self {
        Self { allow_path, block_path, tracker, debounce: Duration::from_millis(500) }
    }

    /// Load both lists once, synchronously, before the server starts
    /// accepting connections.
    pub fn load_initial(&self) {
        let allow = self.load_one(self.allow_path.as_deref());
        let block = self.load_one(self.block_path.as_deref());
        self.tracker.swap_lists(allow, block);
    }

    fn load_one(&self, path: Option<&std::path::Path>) -> IpList {
        match path {
            None => IpList::empty(),
            Some(p) => match IpList::load(p) {
                Ok(list) => list,
                Err(e) => {
                    warn!("failed to read ip list {}: {e}", p.display());
                    IpList::empty()
                }
            },
        }
    }

    /// Run the watch loop until `shutdown` is cancelled. Debounces bursts
    /// of filesystem events (editors often write-then-rename) before
    /// reloading.
    pub async fn run(self, shutdown: CancellationToken) {
        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
        let _watchers = self.setup_notify_watchers(wake_tx);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = wake_rx.recv() => {
                    if received.is_none() {
                        break;
                    }
                }
            }

            tokio::time::sleep(self.debounce).await;
            while wake_rx.try_recv().is_ok() {}

            let allow = self.load_one(self.allow_path.as_deref());
            let block = self.load_one(self.block_path.as_deref());
            info!("reloaded ip allow/block lists");
            self.tracker.swap_lists(allow, block);
        }
    }

    fn setup_notify_watchers(
        &self,
        wake_tx: mpsc::Sender<()>,
    ) -> Vec<notify::RecommendedWatcher> {
        use notify::{RecursiveMode, Watcher};

        let mut watchers = Vec::new();
        for path in [self.allow_path.as_deref(), self.block_path.as_deref()].into_iter().flatten()
        {
            let tx = wake_tx.clone();
            let Ok(mut watcher) =
                notify::recommended_watcher(move |_: notify::Result<notify::Event>| {
                    let _ = tx.try_send(());
                })
            else {
                continue;
            };

            // Watch the parent directory so file creation (the list did
            // not exist at startup) is detected too.
            let watch_path = path.parent().unwrap_or(path);
            if watcher.watch(watch_path, RecursiveMode::NonRecursive).is_ok() {
                watchers.push(watcher);
            }
        }
        watchers
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
