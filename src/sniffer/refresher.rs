//! Periodic topology refresh.
//!
//! # Responsibilities
//! - Sniff the cluster on a fixed interval
//! - Stop cleanly when the shutdown signal fires

use std::time::Duration;
use tokio::time;

use crate::lifecycle::ShutdownSignal;
use crate::sniffer::SniffError;
use crate::transport::Transport;

pub struct TopologyRefresher {
    transport: Transport,
    interval: Duration,
}

impl TopologyRefresher {
    pub fn new(transport: Transport, interval: Duration) -> Self {
        Self { transport, interval }
    }

    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(interval = ?self.interval, "Topology refresher starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Topology refresher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn refresh(&self) {
        match self.transport.sniff().await {
            Ok(summary) if summary.is_unchanged() => {
                tracing::debug!(nodes = summary.retained.len(), "Periodic sniff: topology unchanged");
            }
            Ok(_) => {}
            Err(SniffError::InProgress) => {
                tracing::debug!("Periodic sniff skipped, another sniff is running");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Periodic sniff failed, keeping current topology");
            }
        }
    }
}
