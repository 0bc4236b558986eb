//! Sticky round-robin selection policy.
//!
//! Keeps returning the current connection for as long as it is offered as
//! alive; once it drops out of the list the next one in rotation becomes
//! current.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::connection::{Connection, Host};
use crate::selector::{NoConnectionsAvailable, Selector};

#[derive(Debug, Default)]
pub struct StickyRoundRobinSelector {
    counter: AtomicUsize,
    current: Mutex<Option<Host>>,
}

impl StickyRoundRobinSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Selector for StickyRoundRobinSelector {
    fn select(
        &self,
        connections: &[Arc<dyn Connection>],
    ) -> Result<Arc<dyn Connection>, NoConnectionsAvailable> {
        if connections.is_empty() {
            return Err(NoConnectionsAvailable);
        }

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(host) = current.as_ref() {
            if let Some(conn) = connections.iter().find(|c| c.host() == host) {
                return Ok(conn.clone());
            }
        }

        let index = self.counter.fetch_add(1, Ordering::Relaxed) % connections.len();
        let chosen = connections[index].clone();
        *current = Some(chosen.host().clone());
        Ok(chosen)
    }
}
