//! Uniform random selection policy.

use std::sync::Arc;

use crate::connection::Connection;
use crate::selector::{NoConnectionsAvailable, Selector};

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl RandomSelector {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for RandomSelector {
    fn select(
        &self,
        connections: &[Arc<dyn Connection>],
    ) -> Result<Arc<dyn Connection>, NoConnectionsAvailable> {
        if connections.is_empty() {
            return Err(NoConnectionsAvailable);
        }
        Ok(connections[fastrand::usize(..connections.len())].clone())
    }
}
