//! Connection selection policies.
//!
//! # Data Flow
//! ```text
//! ConnectionPool::next_connection
//!     → filter through DeadPool (alive + probation-eligible)
//!     → Selector::select(alive):
//!         - round_robin.rs   (rotate through connections)
//!         - sticky.rs        (stay on one connection until it dies)
//!         - random.rs        (uniform choice)
//!     → Connection
//! ```
//!
//! # Design Decisions
//! - Selectors only see the already filtered list; health is not their concern
//! - Internal indices are re-derived from the list length on every call

pub mod random;
pub mod round_robin;
pub mod sticky;

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::connection::Connection;

pub use random::RandomSelector;
pub use round_robin::RoundRobinSelector;
pub use sticky::StickyRoundRobinSelector;

/// Nothing to select from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no connections available")]
pub struct NoConnectionsAvailable;

/// Routing policy over the alive connections.
pub trait Selector: Send + Sync + fmt::Debug {
    fn select(
        &self,
        connections: &[Arc<dyn Connection>],
    ) -> Result<Arc<dyn Connection>, NoConnectionsAvailable>;
}
