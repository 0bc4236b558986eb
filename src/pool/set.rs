//! The shared connection set behind every pool implementation.

use arc_swap::ArcSwap;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use crate::connection::{Connection, ConnectionFactory, Host};
use crate::observability::metrics;
use crate::pool::dead_pool::DeadPool;
use crate::selector::{NoConnectionsAvailable, Selector};

/// What a rebuild changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub added: Vec<Host>,
    pub removed: Vec<Host>,
    pub retained: Vec<Host>,
}

impl RebuildSummary {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Connections plus the policies used to pick among them.
#[derive(Debug)]
pub struct ConnectionSet {
    connections: ArcSwap<Vec<Arc<dyn Connection>>>,
    factory: Arc<dyn ConnectionFactory>,
    selector: Box<dyn Selector>,
    dead_pool: Box<dyn DeadPool>,
    randomize: bool,
    /// Serializes rebuilds; readers never take it.
    rebuild_lock: Mutex<()>,
}

impl ConnectionSet {
    pub fn new(
        hosts: &[Host],
        factory: Arc<dyn ConnectionFactory>,
        selector: Box<dyn Selector>,
        dead_pool: Box<dyn DeadPool>,
        randomize: bool,
    ) -> Self {
        let set = Self {
            connections: ArcSwap::from_pointee(Vec::new()),
            factory,
            selector,
            dead_pool,
            randomize,
            rebuild_lock: Mutex::new(()),
        };
        set.rebuild(hosts);
        set
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<dyn Connection>>> {
        self.connections.load_full()
    }

    pub fn alive(&self) -> Vec<Arc<dyn Connection>> {
        self.connections
            .load()
            .iter()
            .filter(|c| self.dead_pool.is_alive(c.host()))
            .cloned()
            .collect()
    }

    pub fn next_connection(
        &self,
        tried: &HashSet<Host>,
    ) -> Result<Arc<dyn Connection>, NoConnectionsAvailable> {
        let (untried, repeats): (Vec<_>, Vec<_>) = self
            .alive()
            .into_iter()
            .partition(|c| !tried.contains(c.host()));

        for mut candidates in [untried, repeats] {
            while !candidates.is_empty() {
                let chosen = self.selector.select(&candidates)?;
                if self.dead_pool.try_claim(chosen.host()) {
                    return Ok(chosen);
                }
                // Lost a probation race to another request.
                candidates.retain(|c| c.host() != chosen.host());
            }
        }
        Err(NoConnectionsAvailable)
    }

    pub fn rebuild(&self, hosts: &[Host]) -> RebuildSummary {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.connections.load_full();

        let mut existing: HashMap<&Host, &Arc<dyn Connection>> =
            current.iter().map(|c| (c.host(), c)).collect();
        let mut seen = HashSet::new();
        let mut summary = RebuildSummary::default();
        let mut next: Vec<Arc<dyn Connection>> = Vec::with_capacity(hosts.len());

        for host in hosts {
            if !seen.insert(host.clone()) {
                continue;
            }
            if let Some(conn) = existing.remove(host) {
                summary.retained.push(host.clone());
                next.push(conn.clone());
                continue;
            }
            match self.factory.create(host) {
                Ok(conn) => {
                    summary.added.push(host.clone());
                    next.push(conn);
                }
                Err(e) => {
                    seen.remove(host);
                    tracing::warn!(host = %host, error = %e, "Failed to create connection, skipping host");
                }
            }
        }
        summary.removed = current
            .iter()
            .map(|c| c.host().clone())
            .filter(|h| !seen.contains(h))
            .collect();

        if self.randomize {
            next.shuffle(&mut rand::thread_rng());
        }

        metrics::record_pool_size(next.len());
        self.connections.store(Arc::new(next));
        self.dead_pool.retain(&seen);
        // A host coming back starts alive, whatever was reported about its
        // previous incarnation.
        for host in &summary.added {
            self.dead_pool.mark_alive(host);
        }

        if !summary.is_unchanged() {
            tracing::info!(
                added = ?summary.added.iter().map(ToString::to_string).collect::<Vec<_>>(),
                removed = ?summary.removed.iter().map(ToString::to_string).collect::<Vec<_>>(),
                retained = summary.retained.len(),
                "Connection pool rebuilt"
            );
        }
        summary
    }

    /// Whether `host` belongs to the current set. Reports about connections
    /// removed by a rebuild are dropped so they cannot recreate dead entries.
    fn is_member(&self, host: &Host) -> bool {
        self.connections.load().iter().any(|c| c.host() == host)
    }

    pub fn report_failure(&self, connection: &dyn Connection) {
        if !self.is_member(connection.host()) {
            tracing::debug!(host = %connection.host(), "Ignoring failure of a removed connection");
            return;
        }
        metrics::record_dead_mark(connection.host());
        self.dead_pool.mark_dead(connection.host());
    }

    pub fn report_success(&self, connection: &dyn Connection) {
        if self.is_member(connection.host()) {
            self.dead_pool.mark_alive(connection.host());
        }
    }

    pub fn dead_pool(&self) -> &dyn DeadPool {
        self.dead_pool.as_ref()
    }
}
