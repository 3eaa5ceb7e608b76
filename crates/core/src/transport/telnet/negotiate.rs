// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Negotiation phase (§4.3): the fixed option offer sent at connect time,
//! plus incremental handling of the client's responses.

use super::codec::{
    encode_negotiation, encode_subnegotiation, Event, DO, DONT, OPT_ECHO, OPT_LINEMODE, OPT_NAWS,
    OPT_SGA, OPT_TERMINAL_TYPE, WILL,
};
use super::window::parse_naws;

/// Terminal-type subnegotiation `SEND` sub-command (RFC 1091).
const TTYPE_SEND: u8 = 1;
/// Terminal-type subnegotiation `IS` sub-command.
const TTYPE_IS: u8 = 0;

/// Accumulates what the negotiation phase discovers about the client.
#[derive(Debug, Default, Clone)]
pub struct Negotiated {
    pub term_type: Option<String>,
    pub naws: Option<(u16, u16)>,
    pub client_will_terminal_type: bool,
}

/// The fixed opening offer (§4.3): `WILL ECHO, WILL SGA, DO SGA, DONT
/// LINEMODE, DO NAWS, DO TERMINAL-TYPE`.
pub fn initial_offer() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(encode_negotiation(WILL, OPT_ECHO));
    out.extend(encode_negotiation(WILL, OPT_SGA));
    out.extend(encode_negotiation(DO, OPT_SGA));
    out.extend(encode_negotiation(DONT, OPT_LINEMODE));
    out.extend(encode_negotiation(DO, OPT_NAWS));
    out.extend(encode_negotiation(DO, OPT_TERMINAL_TYPE));
    out
}

/// The terminal-type query, sent once the client has agreed to the
/// option (`WILL TERMINAL-TYPE`).
pub fn terminal_type_query() -> Vec<u8> {
    encode_subnegotiation(OPT_TERMINAL_TYPE, &[TTYPE_SEND])
}

/// Fold one decoded [`Event`] into `state`, returning any bytes that must
/// be sent back in response (e.g. the terminal-type query).
pub fn handle_event(state: &mut Negotiated, event: &Event) -> Vec<u8> {
    match event {
        Event::Negotiation { command: WILL, option } if *option == OPT_TERMINAL_TYPE => {
            state.client_will_terminal_type = true;
            terminal_type_query()
        }
        Event::Negotiation { .. } => Vec::new(),
        Event::Subnegotiation(payload) => {
            if let [OPT_TERMINAL_TYPE, TTYPE_IS, rest @ ..] = payload.as_slice() {
                state.term_type = Some(String::from_utf8_lossy(rest).to_lowercase());
                Vec::new()
            } else if let [OPT_NAWS, rest @ ..] = payload.as_slice() {
                state.naws = Some(parse_naws(rest));
                Vec::new()
            } else {
                Vec::new()
            }
        }
        Event::Data(_) => Vec::new(),
    }
}

#[cfg(test)]
#[path = "negotiate_tests.rs"]
mod tests;
