// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end admission-control scenarios (§8 S2-S6), run against the
//! real `nodeserver` binary over a raw Telnet socket.
//!
//! S1 and S4's login-loop halves need a real account database, which is
//! an external collaborator (§1) this binary does not ship with by
//! default — those scenarios are covered at the unit level instead
//! (`crates/core/src/admission/tracker_tests.rs`,
//! `crates/core/src/menu/mod_tests.rs`). These tests exercise only the
//! admission-control behavior a real account backend does not change.

use std::time::Duration;

use nodeserver_specs::{append_line, telnet_probe, ConfigBuilder};
use serial_test::serial;

const READY_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

// -- S2: negotiation happens at all ------------------------------------------

#[tokio::test]
#[serial]
async fn telnet_connection_receives_negotiation_bytes() -> anyhow::Result<()> {
    let config = ConfigBuilder::new()?;
    let port = config.telnet_port();
    let server = config.spawn()?;
    server.wait_telnet_ready(READY_TIMEOUT).await?;

    let bytes = telnet_probe(port, PROBE_TIMEOUT).await?;
    // The server always opens with its IAC WILL/DO offer before anything
    // else; a byte with the high bit set (IAC = 255) confirms it.
    assert!(bytes.contains(&255u8), "expected an IAC byte in the initial offer, got {bytes:?}");

    Ok(())
}

// -- S3: per-IP connection limit ---------------------------------------------

#[tokio::test]
#[serial]
async fn per_ip_limit_rejects_the_third_connection() -> anyhow::Result<()> {
    let config = ConfigBuilder::new()?.max_connections_per_ip(2);
    let port = config.telnet_port();
    let server = config.spawn()?;
    server.wait_telnet_ready(READY_TIMEOUT).await?;

    // First two connections are admitted: they should receive the
    // negotiation offer, not a rejection line, and must be kept open so
    // they still count against the per-IP limit for the third attempt.
    let (_first, first_bytes) = nodeserver_specs::telnet_connect_and_read(port, PROBE_TIMEOUT).await?;
    assert!(first_bytes.contains(&255u8));
    let (_second, second_bytes) = nodeserver_specs::telnet_connect_and_read(port, PROBE_TIMEOUT).await?;
    assert!(second_bytes.contains(&255u8));

    let third_bytes = telnet_probe(port, PROBE_TIMEOUT).await?;
    let third_text = String::from_utf8_lossy(&third_bytes);
    assert!(
        third_text.contains("maximum connections per IP reached"),
        "expected a per-IP rejection line, got {third_text:?}"
    );

    Ok(())
}

// -- S5: allowlist bypasses a simultaneous blocklist entry -------------------

#[tokio::test]
#[serial]
async fn allowlisted_ip_is_admitted_even_when_also_blocklisted() -> anyhow::Result<()> {
    let config = ConfigBuilder::new()?;
    let port = config.telnet_port();
    let blocklist = config.blocklist_path();
    let allowlist = config.allowlist_path();
    std::fs::write(&blocklist, "127.0.0.1\n")?;
    std::fs::write(&allowlist, "127.0.0.1\n")?;

    let server = config.spawn()?;
    server.wait_telnet_ready(READY_TIMEOUT).await?;

    let bytes = telnet_probe(port, PROBE_TIMEOUT).await?;
    assert!(bytes.contains(&255u8), "expected the allowlisted IP to be admitted, got {bytes:?}");

    Ok(())
}

// -- S6: hot reload of the blocklist -----------------------------------------

#[tokio::test]
#[serial]
async fn blocklist_hot_reload_blocks_the_next_connection() -> anyhow::Result<()> {
    let config = ConfigBuilder::new()?;
    let port = config.telnet_port();
    let blocklist = config.blocklist_path();

    let server = config.spawn()?;
    server.wait_telnet_ready(READY_TIMEOUT).await?;

    let bytes = telnet_probe(port, PROBE_TIMEOUT).await?;
    assert!(bytes.contains(&255u8), "first connection should be admitted before any ban");

    append_line(&blocklist, "127.0.0.1").await?;
    // Debounce (500ms) plus reload; give it margin.
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let rejected_bytes = telnet_probe(port, PROBE_TIMEOUT).await?;
    let rejected_text = String::from_utf8_lossy(&rejected_bytes);
    assert!(
        rejected_text.contains("blocked"),
        "expected the reloaded blocklist to reject the next connection, got {rejected_text:?}"
    );

    Ok(())
}
