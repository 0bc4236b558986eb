//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Connection attempt fails
//!     → DeadPool::mark_dead
//!     → backoff.rs (revive delay from consecutive failure count)
//! ```
//!
//! # Design Decisions
//! - Delays are deterministic (no jitter) so the revive schedule is monotonic
//! - Flat and exponential policies share one entry point

pub mod backoff;
