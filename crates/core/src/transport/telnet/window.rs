// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NAWS subnegotiation parsing and CPR (cursor-position-report) probing
//! (§4.3). Both feed the session's [`TerminalState`](crate::session::TerminalState)
//! window cap of 80x25 (§9 Open Questions (c)).

use crate::session::terminal::{MAX_HEIGHT, MAX_WIDTH};

/// Parse a NAWS subnegotiation body (after the option byte has been
/// stripped): four bytes, width-hi/width-lo/height-hi/height-lo,
/// big-endian. Returns the clamped `(width, height)`, or the 80x25
/// default if the body is malformed (wrong length).
pub fn parse_naws(body: &[u8]) -> (u16, u16) {
    if body.len() != 4 {
        return (MAX_WIDTH, MAX_HEIGHT);
    }
    let width = u16::from_be_bytes([body[0], body[1]]);
    let height = u16::from_be_bytes([body[2], body[3]]);
    (clamp(width, MAX_WIDTH), clamp(height, MAX_HEIGHT))
}

fn clamp(value: u16, cap: u16) -> u16 {
    if value == 0 {
        cap
    } else {
        value.min(cap)
    }
}

/// Parse a CPR response `ESC[<row>;<col>R` appearing anywhere in
/// `buffer`. Returns `(cols, rows)` clamped to the Telnet cap, or `None`
/// if no well-formed CPR is present.
pub fn parse_cpr(buffer: &[u8]) -> Option<(u16, u16)> {
    let text = std::str::from_utf8(buffer).ok()?;
    let start = text.find("\x1b[")?;
    let rest = &text[start + 2..];
    let end = rest.find('R')?;
    let body = &rest[..end];
    let (row_str, col_str) = body.split_once(';')?;
    let row: u16 = row_str.parse().ok()?;
    let col: u16 = col_str.parse().ok()?;
    Some((clamp(col, MAX_WIDTH), clamp(row, MAX_HEIGHT)))
}

/// The in-band probe sequence: save cursor, jump to an out-of-range
/// position so the terminal clamps to its real bottom-right corner, then
/// request the cursor position.
pub fn cpr_probe_sequence() -> &'static [u8] {
    b"\x1b7\x1b[999;999H\x1b[6n"
}

/// Restore the cursor after a CPR probe.
pub fn cpr_restore_sequence() -> &'static [u8] {
    b"\x1b8"
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
