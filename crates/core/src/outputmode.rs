// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output-Mode Resolver (C6): choose CP437 vs UTF-8 from the process flag,
//! terminal type, and (post-auth) stored user preference.

use crate::config::OutputModeFlag;

/// The resolved output encoding for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Utf8,
    Cp437,
}

/// Terminal-type strings (lowercased) known to expect CP437 rendering.
const CP437_TERMINAL_TYPES: &[&str] = &[
    "syncterm",
    "sync",
    "magiterm",
    "ansi",
    "scoansi",
    "ansi-bbs",
    "netrunner",
    "ansi-256color-rgb",
];

/// Resolve the output mode once, before authentication, from the process
/// flag and detected PTY/terminal-type.
///
/// `has_pty` — whether the session has a PTY at all (Telnet always
/// synthesizes one; a raw non-interactive connection would not).
/// `term_type` — the lowercased, negotiated terminal-type string, if any.
/// `detected_width` — the width detected so far (NAWS/CPR), used by the
/// xterm-over-SSH heuristic.
pub fn resolve(
    flag: OutputModeFlag,
    has_pty: bool,
    term_type: Option<&str>,
    detected_width: u16,
) -> OutputMode {
    match flag {
        OutputModeFlag::Utf8 => return OutputMode::Utf8,
        OutputModeFlag::Cp437 => return OutputMode::Cp437,
        OutputModeFlag::Auto => {}
    }

    if !has_pty {
        return OutputMode::Utf8;
    }

    let Some(term) = term_type else {
        return OutputMode::Utf8;
    };
    let term = term.to_lowercase();

    if CP437_TERMINAL_TYPES.contains(&term.as_str()) || term.starts_with("vt100") {
        return OutputMode::Cp437;
    }

    // Older NetRunner clients over SSH self-report as "xterm" but still
    // expect CP437; a width above the 80-column default is the tell.
    if term == "xterm" && detected_width > 80 {
        return OutputMode::Cp437;
    }

    OutputMode::Utf8
}

/// Apply a user's saved preferred encoding, if any, overriding AUTO
/// detection. Has no effect if the process-wide flag forced a mode
/// explicitly (the caller should not invoke this in that case).
pub fn apply_user_preference(detected: OutputMode, preferred: Option<OutputMode>) -> OutputMode {
    preferred.unwrap_or(detected)
}

#[cfg(test)]
#[path = "outputmode_tests.rs"]
mod tests;
