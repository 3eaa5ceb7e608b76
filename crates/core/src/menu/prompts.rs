// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The prompts §4.8 names during preferences reconciliation and the
//! invisible-login offer are themselves rendered ANSI screens — out of
//! scope per §1 ("per-screen rendering of ANSI art"). This trait is the
//! named seam the executor calls through; a real deployment renders
//! each prompt and reads the user's choice, while tests substitute a
//! fixed-answer stub.

use async_trait::async_trait;

use crate::outputmode::OutputMode;
use crate::transport::TransportSession;

#[async_trait]
pub trait PromptCollaborator: Send + Sync {
    /// "use detected (W×H) or keep stored (W×H)?" — returns the chosen
    /// dimensions.
    async fn prompt_dimension_mismatch(
        &self,
        transport: &mut dyn TransportSession,
        detected: (u16, u16),
        stored: (u16, u16),
    ) -> (u16, u16);

    /// Encoding choice for `needsSetup` xterm sessions (UTF8 default,
    /// CP437 option).
    async fn prompt_output_mode(&self, transport: &mut dyn TransportSession) -> OutputMode;

    /// Offer to reduce a reported height above 25 rows down to at least
    /// `min_height`; returns the chosen height.
    async fn prompt_reduce_height(
        &self,
        transport: &mut dyn TransportSession,
        detected_height: u16,
        min_height: u16,
    ) -> u16;

    /// "invisible logon?" — sysop-and-above only.
    async fn prompt_invisible_login(&self, transport: &mut dyn TransportSession) -> bool;
}

/// A stub collaborator that always keeps detected values and declines
/// every optional prompt — used where no interactive prompt renderer is
/// wired in (tests, or a minimal headless deployment).
pub struct NoPromptCollaborator;

#[async_trait]
impl PromptCollaborator for NoPromptCollaborator {
    async fn prompt_dimension_mismatch(
        &self,
        _transport: &mut dyn TransportSession,
        detected: (u16, u16),
        _stored: (u16, u16),
    ) -> (u16, u16) {
        detected
    }

    async fn prompt_output_mode(&self, _transport: &mut dyn TransportSession) -> OutputMode {
        OutputMode::Utf8
    }

    async fn prompt_reduce_height(
        &self,
        _transport: &mut dyn TransportSession,
        detected_height: u16,
        _min_height: u16,
    ) -> u16 {
        detected_height
    }

    async fn prompt_invisible_login(&self, _transport: &mut dyn TransportSession) -> bool {
        false
    }
}
