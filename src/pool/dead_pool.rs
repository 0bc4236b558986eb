//! Failed connection bookkeeping.
//!
//! # States
//! - Alive: no entry; the connection is eligible
//! - Dead: entry exists and `now < revive_after`; never selected
//! - Probation: revive window elapsed; eligible for exactly one probe
//!
//! # State Transitions
//! ```text
//! Alive     → Dead:      mark_dead
//! Dead      → Probation: revive window elapses
//! Probation → (claimed): try_claim hands the probe to one request
//! claimed   → Alive:     mark_alive after a successful execute
//! claimed   → Dead:      mark_dead, consecutive_failures + 1
//! ```
//!
//! # Design Decisions
//! - Entries are keyed by `Host`, so a rebuild that reuses a connection keeps
//!   its history
//! - Failures reported while already dead (concurrent requests on the same
//!   node) do not extend the backoff again
//! - A claimed probe whose request never reports back is released after one
//!   dead timeout

use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::connection::Host;
use crate::resilience::backoff::{RevivePolicy, revive_delay};

/// One failed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadEntry {
    pub failed_at: Instant,
    pub revive_after: Instant,
    pub consecutive_failures: u32,
    probe_claimed_at: Option<Instant>,
}

impl DeadEntry {
    /// True while a request holds the probation slot.
    pub fn is_probing(&self) -> bool {
        self.probe_claimed_at.is_some()
    }
}

/// Health state of a connection as seen by the dead pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Alive,
    Dead,
    Probation,
}

/// Failure tracking with timeout-based revival.
pub trait DeadPool: Send + Sync + fmt::Debug {
    /// Record a failed attempt against `host`.
    fn mark_dead(&self, host: &Host);

    /// Record a successful attempt. Returns true if the host was dead.
    fn mark_alive(&self, host: &Host) -> bool;

    /// True if never marked dead, or if the revive window has elapsed and no
    /// other request currently holds the probe.
    fn is_alive(&self, host: &Host) -> bool;

    /// Claim a host for use. Always succeeds for alive hosts; for probation
    /// hosts only the first caller wins.
    fn try_claim(&self, host: &Host) -> bool;

    fn state(&self, host: &Host) -> NodeState;

    fn entry(&self, host: &Host) -> Option<DeadEntry>;

    /// Drop entries for hosts no longer in the pool.
    fn retain(&self, hosts: &HashSet<Host>);

    fn dead_hosts(&self) -> Vec<Host>;
}

/// Dead pool driven by a dead timeout and a revive policy.
#[derive(Debug)]
pub struct TimeoutDeadPool {
    entries: DashMap<Host, DeadEntry>,
    dead_timeout: Duration,
    policy: RevivePolicy,
}

impl TimeoutDeadPool {
    /// Flat revive window of `dead_timeout`.
    pub fn new(dead_timeout: Duration) -> Self {
        Self::with_policy(dead_timeout, RevivePolicy::Flat)
    }

    pub fn with_policy(dead_timeout: Duration, policy: RevivePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            dead_timeout,
            policy,
        }
    }

    fn probe_expired(&self, entry: &DeadEntry, now: Instant) -> bool {
        entry
            .probe_claimed_at
            .is_some_and(|claimed| now >= claimed + self.dead_timeout)
    }
}

impl DeadPool for TimeoutDeadPool {
    fn mark_dead(&self, host: &Host) {
        let now = Instant::now();
        let mut entry = self.entries.entry(host.clone()).or_insert_with(|| DeadEntry {
            failed_at: now,
            revive_after: now,
            consecutive_failures: 0,
            probe_claimed_at: None,
        });

        if entry.consecutive_failures > 0 && now < entry.revive_after && !entry.is_probing() {
            tracing::trace!(host = %host, "Failure reported for a host already marked dead");
            return;
        }

        entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
        entry.failed_at = now;
        entry.revive_after = now + revive_delay(entry.consecutive_failures, self.dead_timeout, self.policy);
        entry.probe_claimed_at = None;

        tracing::warn!(
            host = %host,
            consecutive_failures = entry.consecutive_failures,
            revive_in = ?entry.revive_after.saturating_duration_since(now),
            "Connection marked dead"
        );
    }

    fn mark_alive(&self, host: &Host) -> bool {
        match self.entries.remove(host) {
            Some((_, entry)) => {
                tracing::info!(
                    host = %host,
                    consecutive_failures = entry.consecutive_failures,
                    "Connection revived"
                );
                true
            }
            None => false,
        }
    }

    fn is_alive(&self, host: &Host) -> bool {
        let now = Instant::now();
        match self.entries.get(host) {
            None => true,
            Some(entry) => {
                now >= entry.revive_after && (!entry.is_probing() || self.probe_expired(&entry, now))
            }
        }
    }

    fn try_claim(&self, host: &Host) -> bool {
        let now = Instant::now();
        match self.entries.get_mut(host) {
            None => true,
            Some(mut entry) => {
                if now < entry.revive_after {
                    return false;
                }
                if entry.is_probing() && !self.probe_expired(&entry, now) {
                    return false;
                }
                entry.probe_claimed_at = Some(now);
                tracing::debug!(host = %host, "Probing connection on probation");
                true
            }
        }
    }

    fn state(&self, host: &Host) -> NodeState {
        match self.entries.get(host) {
            None => NodeState::Alive,
            Some(entry) if Instant::now() < entry.revive_after => NodeState::Dead,
            Some(_) => NodeState::Probation,
        }
    }

    fn entry(&self, host: &Host) -> Option<DeadEntry> {
        self.entries.get(host).map(|e| e.value().clone())
    }

    fn retain(&self, hosts: &HashSet<Host>) {
        self.entries.retain(|host, _| hosts.contains(host));
    }

    fn dead_hosts(&self) -> Vec<Host> {
        let mut hosts: Vec<Host> = self.entries.iter().map(|e| e.key().clone()).collect();
        hosts.sort();
        hosts
    }
}
