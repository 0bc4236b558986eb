//! Per-request retry bookkeeping.

use std::collections::HashSet;

use crate::connection::{ConnectionError, Host};
use crate::transport::error::AttemptFailure;

/// Retry state of one logical request; discarded when it completes.
#[derive(Debug)]
pub struct RetryState {
    attempts_remaining: u32,
    attempts_made: u32,
    tried: HashSet<Host>,
    failures: Vec<AttemptFailure>,
}

impl RetryState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempts_remaining: max_retries.saturating_add(1),
            attempts_made: 0,
            tried: HashSet::new(),
            failures: Vec::new(),
        }
    }

    pub fn tried(&self) -> &HashSet<Host> {
        &self.tried
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Start an attempt; returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts_made += 1;
        self.attempts_made
    }

    pub fn record_failure(&mut self, host: Host, error: ConnectionError) {
        self.tried.insert(host.clone());
        self.failures.push(AttemptFailure { host, error });
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
    }

    pub fn exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }

    pub fn into_failures(self) -> Vec<AttemptFailure> {
        self.failures
    }
}
