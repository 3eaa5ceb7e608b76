// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Menu Executor (C8, §4.8): the post-admission state machine that
//! drives a session from the matrix screen through login and the
//! post-auth menu loop until logoff. The menu *scripts* themselves
//! (what a given named menu actually renders and which next-menu names
//! it can return) are an external collaborator — §1 lists "per-screen
//! rendering of ANSI art" and the message/file areas as out of scope —
//! so this module only owns the control flow named in §4.8: routing,
//! the login loop, preferences reconciliation, the invisible-login
//! prompt, and the post-auth main loop.

mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Error;
use crate::outputmode::{self, OutputMode};
use crate::session::Session;
use crate::transport::TransportSession;
use crate::user::{AuthenticatedUser, UserPreferences, UserService};

pub use prompts::{NoPromptCollaborator, PromptCollaborator};

const LOGOFF: &str = "LOGOFF";
const MATRIX: &str = "MATRIX";
const LOGIN: &str = "LOGIN";
const MIN_USABLE_HEIGHT: u16 = 20;

/// What one menu invocation produced (§4.8's `run` contract, minus the
/// session/context arguments which the executor already holds).
pub struct MenuStepOutcome {
    pub next: String,
    pub authenticated_user: Option<AuthenticatedUser>,
}

/// The external collaborator that interprets a named menu's script
/// against the live session and transport. Concrete implementations own
/// the script format and ANSI rendering; the executor only needs the
/// name-in, outcome-out contract from §4.8.
#[async_trait]
pub trait MenuProvider: Send + Sync {
    async fn run_menu(
        &self,
        name: &str,
        session: &Session,
        transport: &mut dyn TransportSession,
        user: Option<&AuthenticatedUser>,
    ) -> Result<MenuStepOutcome, Error>;
}

/// Drives one session from admission to disconnect.
pub struct MenuExecutor {
    provider: Arc<dyn MenuProvider>,
    users: Arc<dyn UserService>,
    prompts: Arc<dyn PromptCollaborator>,
    co_sysop_level: u32,
}

impl MenuExecutor {
    pub fn new(
        provider: Arc<dyn MenuProvider>,
        users: Arc<dyn UserService>,
        prompts: Arc<dyn PromptCollaborator>,
        co_sysop_level: u32,
    ) -> Self {
        Self { provider, users, prompts, co_sysop_level }
    }

    /// Run the full session lifecycle: session-start routing, the login
    /// loop, post-auth reconciliation, and the main loop, until the
    /// session reaches "LOGOFF" or the transport disconnects.
    pub async fn run(&self, session: &Session, transport: &mut dyn TransportSession) {
        let user = match self.route_session_start(session, transport).await {
            Some(user) => user,
            None => return,
        };

        session.set_user(user.username.clone());
        self.reconcile_preferences(session, transport, &user).await;
        self.offer_invisible_login(session, transport, &user).await;
        self.run_main_loop(session, transport, &user).await;
    }

    /// §4.8 "Session-start routing": SSH auto-auth if the transport
    /// already delivered a known username, otherwise the matrix screen
    /// and login loop.
    async fn route_session_start(
        &self,
        session: &Session,
        transport: &mut dyn TransportSession,
    ) -> Option<AuthenticatedUser> {
        let transport_user = transport.user();
        if !transport_user.is_empty() {
            if let Some(user) = self.users.lookup(transport_user).await {
                info!(session_id = session.context.session_id, user = %user.username, "auto-authenticated via transport");
                session.set_current_menu(LOGIN);
                return Some(user);
            }
        }

        self.run_login_loop(session, transport).await
    }

    /// §4.8 "Login loop": run the current menu until it returns an
    /// authenticated user, or an empty/"LOGOFF" next name (disconnect),
    /// or a menu error (also forces "LOGOFF").
    async fn run_login_loop(
        &self,
        session: &Session,
        transport: &mut dyn TransportSession,
    ) -> Option<AuthenticatedUser> {
        let mut current = MATRIX.to_owned();
        loop {
            session.set_current_menu(&current);
            match self.provider.run_menu(&current, session, transport, None).await {
                Ok(outcome) => {
                    if let Some(user) = outcome.authenticated_user {
                        return Some(user);
                    }
                    if is_terminal(&outcome.next) {
                        return None;
                    }
                    current = outcome.next;
                }
                Err(e) => {
                    warn!("menu error in login loop ({current}): {e}");
                    return None;
                }
            }
        }
    }

    /// §4.8 "Post-auth preferences reconciliation".
    async fn reconcile_preferences(
        &self,
        session: &Session,
        transport: &mut dyn TransportSession,
        user: &AuthenticatedUser,
    ) {
        let prefs = user.preferences;
        let pty = transport.pty();
        let needs_setup = prefs.needs_setup();

        let has_stored_dims = prefs.width != 0 && prefs.height != 0;
        let resolved_dims = match (&pty, has_stored_dims) {
            (Some(p), true) if (p.width, p.height) != (prefs.width, prefs.height) => {
                self.prompts
                    .prompt_dimension_mismatch(transport, (p.width, p.height), (prefs.width, prefs.height))
                    .await
            }
            (Some(p), false) => {
                // No stored dimensions: accept detected values silently.
                self.users
                    .save_preferences(
                        &user.username,
                        UserPreferences { width: p.width, height: p.height, output_mode: prefs.output_mode },
                    )
                    .await;
                (p.width, p.height)
            }
            (Some(p), true) => (p.width, p.height),
            (None, _) => (prefs.width, prefs.height),
        };

        if let Some(p) = &pty {
            session.terminal.set(resolved_dims.0, resolved_dims.1);

            if needs_setup && p.term.eq_ignore_ascii_case("xterm") {
                let chosen_mode = self.prompts.prompt_output_mode(transport).await;
                let mut chosen_height = resolved_dims.1;
                if resolved_dims.1 > 25 {
                    chosen_height = self
                        .prompts
                        .prompt_reduce_height(transport, resolved_dims.1, MIN_USABLE_HEIGHT)
                        .await;
                }
                session.terminal.set(resolved_dims.0, chosen_height);
                self.users
                    .save_preferences(
                        &user.username,
                        UserPreferences { width: resolved_dims.0, height: chosen_height, output_mode: Some(chosen_mode) },
                    )
                    .await;
                *session.output_mode.lock() = chosen_mode;
                return;
            }
        }

        let detected_mode = outputmode::resolve(
            crate::config::OutputModeFlag::Auto,
            pty.is_some(),
            pty.as_ref().map(|p| p.term.as_str()),
            resolved_dims.0,
        );
        *session.output_mode.lock() = outputmode::apply_user_preference(detected_mode, prefs.output_mode);
    }

    /// §4.8 "Invisible login prompt": sysop-and-above only (§9 Open
    /// Question (b)).
    async fn offer_invisible_login(
        &self,
        session: &Session,
        transport: &mut dyn TransportSession,
        user: &AuthenticatedUser,
    ) {
        if !user.meets_co_sysop_threshold(self.co_sysop_level) {
            return;
        }
        if self.prompts.prompt_invisible_login(transport).await {
            session.set_invisible(true);
        }
    }

    /// §4.8 "Post-auth main loop".
    async fn run_main_loop(&self, session: &Session, transport: &mut dyn TransportSession, user: &AuthenticatedUser) {
        let mut current = match self.provider.run_menu(LOGIN, session, transport, Some(user)).await {
            Ok(outcome) => outcome.next,
            Err(e) => {
                warn!("login sequence error: {e}");
                return;
            }
        };

        loop {
            if is_terminal(&current) {
                return;
            }
            session.set_current_menu(&current);
            match self.provider.run_menu(&current, session, transport, Some(user)).await {
                Ok(outcome) => current = outcome.next,
                Err(e) => {
                    warn!(menu = %current, "menu execution error: {e}");
                    return;
                }
            }
        }
    }
}

fn is_terminal(next: &str) -> bool {
    next.is_empty() || next.eq_ignore_ascii_case(LOGOFF)
}

/// A `MenuProvider` that renders nothing and disconnects immediately —
/// used where no real menu-script collaborator has been wired in yet.
/// Deployments that actually serve BBS screens plug in their own
/// implementation that interprets the configured menu scripts; the
/// executor's control flow above is agnostic to that format.
pub struct NullMenuProvider;

#[async_trait]
impl MenuProvider for NullMenuProvider {
    async fn run_menu(
        &self,
        _name: &str,
        _session: &Session,
        _transport: &mut dyn TransportSession,
        _user: Option<&AuthenticatedUser>,
    ) -> Result<MenuStepOutcome, Error> {
        Ok(MenuStepOutcome { next: LOGOFF.to_owned(), authenticated_user: None })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
