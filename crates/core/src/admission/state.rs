// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide admission state (§3 "Admission State").

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Instant;

/// Per-IP failed-login tracking.
#[derive(Debug, Clone, Copy)]
pub struct FailedLoginRecord {
    pub attempts: u32,
    pub last_attempt: Instant,
    pub locked_until: Option<Instant>,
}

/// The mutable counters guarded by the tracker's single lock.
///
/// Invariant: `total_active == active_by_ip.values().sum()`.
#[derive(Debug, Default)]
pub struct Inner {
    pub active_by_ip: HashMap<IpAddr, u32>,
    pub total_active: u32,
    pub failed_logins: HashMap<IpAddr, FailedLoginRecord>,
}

impl Inner {
    /// Debug-only invariant check, used by property tests.
    #[cfg(test)]
    pub fn check_invariant(&self) {
        let sum: u32 = self.active_by_ip.values().sum();
        assert_eq!(self.total_active, sum, "totalActive must equal sum(activeByIP)");
    }
}

/// Outcome of [`crate::admission::AdmissionTracker::try_admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitResult {
    Admitted,
    Rejected(&'static str),
}

impl AdmitResult {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmitResult::Admitted)
    }
}

/// Outcome of [`crate::admission::AdmissionTracker::is_locked_out`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutStatus {
    pub locked: bool,
    /// Populated (as a duration since `Instant::now()` at call time would
    /// be, but expressed as the raw deadline) when `locked` is true.
    pub until: Option<Instant>,
    /// Attempts remaining before lockout trips. Reset to `maxFailed` when
    /// no record exists or the previous lockout has expired.
    pub remaining_attempts: u32,
}
