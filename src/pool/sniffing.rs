//! Pool whose topology follows the cluster's own membership reports.

use std::collections::HashSet;
use std::sync::Arc;

use crate::connection::{Connection, Host};
use crate::pool::{ConnectionPool, ConnectionSet, DeadPool, RebuildSummary};
use crate::selector::NoConnectionsAvailable;

#[derive(Debug)]
pub struct SniffingConnectionPool {
    set: ConnectionSet,
}

impl SniffingConnectionPool {
    pub fn new(set: ConnectionSet) -> Self {
        Self { set }
    }
}

impl ConnectionPool for SniffingConnectionPool {
    fn next_connection(
        &self,
        tried: &HashSet<Host>,
    ) -> Result<Arc<dyn Connection>, NoConnectionsAvailable> {
        self.set.next_connection(tried)
    }

    fn rebuild(&self, hosts: &[Host]) -> RebuildSummary {
        self.set.rebuild(hosts)
    }

    fn report_failure(&self, connection: &dyn Connection) {
        self.set.report_failure(connection)
    }

    fn report_success(&self, connection: &dyn Connection) {
        self.set.report_success(connection)
    }

    fn connections(&self) -> Arc<Vec<Arc<dyn Connection>>> {
        self.set.snapshot()
    }

    fn alive_connections(&self) -> Vec<Arc<dyn Connection>> {
        self.set.alive()
    }

    fn dead_pool(&self) -> &dyn DeadPool {
        self.set.dead_pool()
    }

    fn accepts_sniffed_topology(&self) -> bool {
        true
    }
}
