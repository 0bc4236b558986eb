//! Client-side transport for clusters of interchangeable HTTP nodes.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──▶ Transport::perform_request
//!                 │
//!                 ├─ serializer   encode body / decode response
//!                 ├─ retry loop   at most max_retries + 1 attempts
//!                 │      │
//!                 │      ▼
//!                 │   ConnectionPool ──▶ Selector (round robin, sticky, random)
//!                 │      │          └──▶ DeadPool (timeouts, probation)
//!                 │      ▼
//!                 │   Connection ──────▶ node
//!                 │
//!                 └─ sniff triggers ──▶ Sniffer ──▶ pool.rebuild(hosts)
//! ```
//!
//! Every role is a trait and can be replaced through [`TransportBuilder`].

// Core subsystems
pub mod connection;
pub mod pool;
pub mod selector;
pub mod serializer;
pub mod sniffer;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::TransportConfig;
pub use connection::{Connection, ConnectionError, Host};
pub use lifecycle::Shutdown;
pub use pool::ConnectionPool;
pub use sniffer::SniffError;
pub use transport::{Request, Response, Transport, TransportBuilder, TransportError};
