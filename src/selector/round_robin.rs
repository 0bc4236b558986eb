//! Round-robin selection policy.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::connection::Connection;
use crate::selector::{NoConnectionsAvailable, Selector};

/// Round-robin selector.
/// Stores a monotonically advancing counter; the index is taken modulo the
/// length of the list passed in, so shrinking or growing sets stay valid.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    counter: AtomicUsize,
}

impl RoundRobinSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Selector for RoundRobinSelector {
    fn select(
        &self,
        connections: &[Arc<dyn Connection>],
    ) -> Result<Arc<dyn Connection>, NoConnectionsAvailable> {
        if connections.is_empty() {
            return Err(NoConnectionsAvailable);
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % connections.len();
        Ok(connections[index].clone())
    }
}
