// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::codec::{DO, OPT_NAWS, OPT_TERMINAL_TYPE, WILL};
use super::*;

#[test]
fn initial_offer_contains_expected_six_commands() {
    let offer = initial_offer();
    // 6 commands * 3 bytes (IAC cmd opt) = 18 bytes.
    assert_eq!(offer.len(), 18);
}

#[test]
fn will_terminal_type_triggers_query() {
    let mut state = Negotiated::default();
    let response =
        handle_event(&mut state, &Event::Negotiation { command: WILL, option: OPT_TERMINAL_TYPE });
    assert!(state.client_will_terminal_type);
    assert_eq!(response, terminal_type_query());
}

#[test]
fn terminal_type_subnegotiation_is_recorded_lowercased() {
    let mut state = Negotiated::default();
    let payload = {
        let mut v = vec![OPT_TERMINAL_TYPE, 0];
        v.extend_from_slice(b"SyncTERM");
        v
    };
    handle_event(&mut state, &Event::Subnegotiation(payload));
    assert_eq!(state.term_type.as_deref(), Some("syncterm"));
}

#[test]
fn naws_subnegotiation_is_recorded() {
    let mut state = Negotiated::default();
    let payload = vec![OPT_NAWS, 0, 80, 0, 25];
    handle_event(&mut state, &Event::Subnegotiation(payload));
    assert_eq!(state.naws, Some((80, 25)));
}

#[test]
fn unrelated_negotiation_is_ignored() {
    let mut state = Negotiated::default();
    let response = handle_event(&mut state, &Event::Negotiation { command: DO, option: 99 });
    assert!(response.is_empty());
    assert!(state.term_type.is_none());
}
