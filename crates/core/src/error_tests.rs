// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn benign_disconnect_classification() {
    assert!(Error::ReadInterrupted.is_benign_disconnect());
    assert!(Error::Disconnect.is_benign_disconnect());
    assert!(!Error::NegotiationFailed.is_benign_disconnect());
    assert!(!Error::TerminalProbeTimeout.is_benign_disconnect());
}

#[test]
fn admission_rejected_message_carries_reason() {
    let err = Error::AdmissionRejected { reason: "blocked".into() };
    assert_eq!(err.to_string(), "connection rejected: blocked");
}

#[test]
fn host_key_missing_message_carries_path() {
    let err = Error::HostKeyMissing(PathBuf::from("/etc/bbs/host_key"));
    assert!(err.to_string().contains("/etc/bbs/host_key"));
}
