// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Algorithm policy (§4.4): modern vs legacy KEX/cipher/MAC whitelists.

use std::borrow::Cow;

use russh::Preferred;

/// Modern whitelist: whatever `russh` ships as its own current default
/// (current KEX/ciphers/MACs plus rsa-sha2-256/512).
pub fn modern() -> Preferred {
    Preferred::default()
}

/// Legacy whitelist: the modern set extended with the retro-BBS-client
/// algorithms named in §4.4 — required for clients that predate current
/// KEX/cipher negotiation.
pub fn legacy() -> Preferred {
    let modern = Preferred::default();
    Preferred {
        kex: extend(modern.kex, &["diffie-hellman-group1-sha1", "diffie-hellman-group14-sha1"]),
        cipher: extend(
            modern.cipher,
            &["3des-cbc", "aes128-cbc", "aes192-cbc", "aes256-cbc"],
        ),
        mac: extend(modern.mac, &["hmac-sha1"]),
        key: extend(modern.key, &["ssh-rsa"]),
        ..modern
    }
}

/// Choose the whitelist for this connection based on the
/// `legacySSHAlgorithms` config flag.
pub fn select(legacy_enabled: bool) -> Preferred {
    if legacy_enabled {
        legacy()
    } else {
        modern()
    }
}

fn extend(
    existing: Cow<'static, [&'static str]>,
    extra: &'static [&'static str],
) -> Cow<'static, [&'static str]> {
    let mut combined: Vec<&'static str> = existing.into_owned();
    combined.extend_from_slice(extra);
    Cow::Owned(combined)
}

#[cfg(test)]
#[path = "algorithms_tests.rs"]
mod tests;
