//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Transport, pool, sniffer produce:
//!     → tracing events (structured fields: host, attempt, request_id)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber, or one installed by the caller
//!     → any `metrics` recorder (the binary installs Prometheus)
//! ```
//!
//! # Design Decisions
//! - The library never requires a sink; without one events are dropped
//! - Request ID flows through the span and the `x-request-id` header
//! - Metrics are cheap (atomic increments behind the facade)

pub mod logging;
pub mod metrics;
