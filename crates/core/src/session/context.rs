// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Context: ambient metadata carried alongside a [`super::Session`].

use std::collections::HashMap;
use std::net::SocketAddr;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Ambient metadata for one session, independent of transport kind.
pub struct SessionContext {
    pub session_id: String,
    pub remote_addr: SocketAddr,
    pub local_addr: SocketAddr,
    pub client_banner: Mutex<Option<String>>,
    pub server_banner: String,
    values: Mutex<HashMap<String, String>>,
    pub cancellation: CancellationToken,
}

impl SessionContext {
    pub fn new(remote_addr: SocketAddr, local_addr: SocketAddr, server_banner: String) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            remote_addr,
            local_addr,
            client_banner: Mutex::new(None),
            server_banner,
            values: Mutex::new(HashMap::new()),
            cancellation: CancellationToken::new(),
        }
    }

    /// Store a request-scoped value, overwriting any prior value at `key`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.lock().insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
