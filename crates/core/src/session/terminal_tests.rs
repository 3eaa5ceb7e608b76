// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

#[test]
fn defaults_to_80x25() {
    let (state, _rx) = TerminalState::new();
    assert_eq!(state.width(), 80);
    assert_eq!(state.height(), 25);
}

#[test]
fn set_updates_both_dimensions() {
    let (state, _rx) = TerminalState::new();
    state.set(132, 43);
    assert_eq!(state.width(), 132);
    assert_eq!(state.height(), 43);
}

#[test]
fn publish_resize_delivers_clamped_pair() -> anyhow::Result<()> {
    let (state, mut rx) = TerminalState::new();
    state.publish_resize(200, 60);
    let (w, h) = rx.try_recv()?;
    assert_eq!((w, h), (80, 25));
    Ok(())
}

#[test]
fn publish_resize_drops_when_channel_full() -> anyhow::Result<()> {
    let (state, mut rx) = TerminalState::new();
    state.publish_resize(70, 20);
    state.publish_resize(75, 22);
    let (w, h) = rx.try_recv()?;
    assert_eq!((w, h), (70, 20));
    assert!(rx.try_recv().is_err());
    Ok(())
}

proptest! {
    #[test]
    fn naws_clamped_to_telnet_cap(w in 1u16..=255, h in 1u16..=255) {
        let (state, mut rx) = TerminalState::new();
        state.publish_resize(w, h);
        let (ew, eh) = rx.try_recv().map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(ew, w.min(80));
        prop_assert_eq!(eh, h.min(25));
    }
}
