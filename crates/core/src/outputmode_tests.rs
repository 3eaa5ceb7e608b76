// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::OutputModeFlag;

#[test]
fn forced_flag_wins_regardless_of_terminal() {
    assert_eq!(resolve(OutputModeFlag::Utf8, true, Some("syncterm"), 80), OutputMode::Utf8);
    assert_eq!(resolve(OutputModeFlag::Cp437, true, Some("xterm-256color"), 80), OutputMode::Cp437);
}

#[test]
fn no_pty_defaults_utf8() {
    assert_eq!(resolve(OutputModeFlag::Auto, false, None, 0), OutputMode::Utf8);
}

#[test]
fn known_retro_terminal_types_resolve_cp437() {
    for term in ["syncterm", "sync", "magiterm", "ansi", "scoansi", "ansi-bbs", "netrunner"] {
        assert_eq!(
            resolve(OutputModeFlag::Auto, true, Some(term), 80),
            OutputMode::Cp437,
            "{term} should resolve to CP437"
        );
    }
}

#[test]
fn vt100_prefix_resolves_cp437() {
    assert_eq!(resolve(OutputModeFlag::Auto, true, Some("vt100-color"), 80), OutputMode::Cp437);
}

#[test]
fn modern_xterm_resolves_utf8() {
    assert_eq!(resolve(OutputModeFlag::Auto, true, Some("xterm-256color"), 80), OutputMode::Utf8);
}

#[test]
fn xterm_with_wide_detected_width_resolves_cp437() {
    assert_eq!(resolve(OutputModeFlag::Auto, true, Some("xterm"), 132), OutputMode::Cp437);
}

#[test]
fn xterm_at_default_width_resolves_utf8() {
    assert_eq!(resolve(OutputModeFlag::Auto, true, Some("xterm"), 80), OutputMode::Utf8);
}

#[test]
fn missing_terminal_type_resolves_utf8() {
    assert_eq!(resolve(OutputModeFlag::Auto, true, None, 0), OutputMode::Utf8);
}

#[test]
fn user_preference_overrides_auto_detection() {
    let detected = OutputMode::Utf8;
    assert_eq!(apply_user_preference(detected, Some(OutputMode::Cp437)), OutputMode::Cp437);
    assert_eq!(apply_user_preference(detected, None), OutputMode::Utf8);
}
