// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IP allow/block list parsing and CIDR matching (C2).
//!
//! Format: one IP or CIDR per line. Blank lines and `#`-prefixed comments
//! are ignored; trailing `#`-comments on data lines are stripped after
//! whitespace. Malformed lines are logged and skipped.

use std::net::IpAddr;
use std::path::Path;

use tracing::warn;

/// One parsed allow/block list: exact IPs plus an ordered sequence of
/// CIDR ranges. Cheap to clone so a watcher can swap in a fresh copy
/// under a single lock.
#[derive(Debug, Clone, Default)]
pub struct IpList {
    exact: std::collections::HashSet<IpAddr>,
    cidrs: Vec<Cidr>,
}

#[derive(Debug, Clone, Copy)]
struct Cidr {
    network: IpAddr,
    prefix_len: u8,
}

impl IpList {
    /// An empty list (no file configured — disables the list, per §4.2).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a list from text content.
    pub fn parse(text: &str) -> Self {
        let mut exact = std::collections::HashSet::new();
        let mut cidrs = Vec::new();

        for (lineno, raw_line) in text.lines().enumerate() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            match parse_entry(line) {
                Some(Entry::Exact(ip)) => {
                    exact.insert(ip);
                }
                Some(Entry::Cidr(cidr)) => cidrs.push(cidr),
                None => {
                    warn!("ip list: skipping malformed line {}: {raw_line:?}", lineno + 1);
                }
            }
        }

        Self { exact, cidrs }
    }

    /// Load a list from disk. A missing file is not an error; it yields
    /// an empty (disabled) list.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::empty()),
            Err(e) => Err(e),
        }
    }

    /// Whether `ip` matches an exact entry or falls within a CIDR range.
    pub fn contains(&self, ip: IpAddr) -> bool {
        if self.exact.contains(&ip) {
            return true;
        }
        self.cidrs.iter().any(|c| c.contains(ip))
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.cidrs.is_empty()
    }

    /// Add one exact IP in place, leaving every existing entry untouched.
    pub fn insert_exact(&mut self, ip: IpAddr) {
        self.exact.insert(ip);
    }
}

enum Entry {
    Exact(IpAddr),
    Cidr(Cidr),
}

fn parse_entry(line: &str) -> Option<Entry> {
    if let Some((addr, len)) = line.split_once('/') {
        let network: IpAddr = addr.trim().parse().ok()?;
        let prefix_len: u8 = len.trim().parse().ok()?;
        let max = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return None;
        }
        Some(Entry::Cidr(Cidr { network, prefix_len }))
    } else {
        let ip: IpAddr = line.parse().ok()?;
        Some(Entry::Exact(ip))
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

impl Cidr {
    fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(candidate)) => {
                prefix_match_u32(u32::from(net), u32::from(candidate), self.prefix_len, 32)
            }
            (IpAddr::V6(net), IpAddr::V6(candidate)) => {
                prefix_match_u128(u128::from(net), u128::from(candidate), self.prefix_len, 128)
            }
            _ => false,
        }
    }
}

/// Longest-prefix match over the top `prefix_len` bits of a 32-bit address.
fn prefix_match_u32(a: u32, b: u32, prefix_len: u8, width: u32) -> bool {
    if prefix_len as u32 >= width {
        return a == b;
    }
    let shift = width - prefix_len as u32;
    (a ^ b) >> shift == 0
}

/// Longest-prefix match over the top `prefix_len` bits of a 128-bit address.
fn prefix_match_u128(a: u128, b: u128, prefix_len: u8, width: u32) -> bool {
    if prefix_len as u32 >= width {
        return a == b;
    }
    let shift = width - prefix_len as u32;
    (a ^ b) >> shift == 0
}

/// Format the blocklist auto-ban line for an IP (spec §6).
pub fn format_auto_ban_line(ip: IpAddr, timestamp: &str) -> String {
    format!("{ip} # auto-blocked {timestamp}: too many failed logins")
}

#[cfg(test)]
#[path = "iplist_tests.rs"]
mod tests;
