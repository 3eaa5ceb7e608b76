// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user database and message-base layers are external collaborators
//! (§1): the core only needs enough of a contract to authenticate, read
//! preferences, and reconcile them post-login. `UserService` is that
//! named interface; nothing in this module owns persistence.

use async_trait::async_trait;

use crate::outputmode::OutputMode;

/// Stored preferences the core reads post-authentication and may write
/// back (§3 "User Preferences (consumed, not owned)").
#[derive(Debug, Clone, Copy, Default)]
pub struct UserPreferences {
    pub output_mode: Option<OutputMode>,
    pub width: u16,
    pub height: u16,
}

impl UserPreferences {
    /// §4.8 step 1: true when any of the stored fields are unset.
    pub fn needs_setup(&self) -> bool {
        self.width == 0 || self.height == 0 || self.output_mode.is_none()
    }
}

/// A user account as the core needs to see it: identity, access level,
/// and the preferences reconciliation depends on.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub access_level: u32,
    pub preferences: UserPreferences,
}

impl AuthenticatedUser {
    pub fn meets_co_sysop_threshold(&self, co_sysop_level: u32) -> bool {
        self.access_level >= co_sysop_level
    }
}

/// The external collaborator the menu executor authenticates against and
/// reads/writes preferences through. The message base, file area, and
/// every other subsystem named in §1's "out of scope" list sit behind
/// implementations of this trait; the core never reaches into their
/// storage directly.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Look up a user by name without checking a password — used for
    /// SSH's auto-authentication path (§4.8 "session-start routing"),
    /// where the transport already delivered a username and only
    /// existence needs confirming.
    async fn lookup(&self, username: &str) -> Option<AuthenticatedUser>;

    /// Validate a password for a known username.
    async fn authenticate(&self, username: &str, password: &str) -> Option<AuthenticatedUser>;

    async fn save_preferences(&self, username: &str, preferences: UserPreferences);
}

/// An in-memory `UserService` for tests and for standalone/demo
/// deployments that have not wired in a real account database.
pub struct InMemoryUserService {
    users: parking_lot::Mutex<std::collections::HashMap<String, AuthenticatedUser>>,
}

impl InMemoryUserService {
    pub fn new() -> Self {
        Self { users: parking_lot::Mutex::new(std::collections::HashMap::new()) }
    }

    pub fn insert(&self, user: AuthenticatedUser) {
        self.users.lock().insert(user.username.clone(), user);
    }
}

impl Default for InMemoryUserService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserService for InMemoryUserService {
    async fn lookup(&self, username: &str) -> Option<AuthenticatedUser> {
        self.users.lock().get(username).cloned()
    }

    async fn authenticate(&self, username: &str, _password: &str) -> Option<AuthenticatedUser> {
        // Password verification is an external collaborator concern; the
        // in-memory stub accepts any password for a known account so
        // tests can exercise the menu executor's login loop.
        self.users.lock().get(username).cloned()
    }

    async fn save_preferences(&self, username: &str, preferences: UserPreferences) {
        if let Some(user) = self.users.lock().get_mut(username) {
            user.preferences = preferences;
        }
    }
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
