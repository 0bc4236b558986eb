//! Lifecycle management for background tasks.
//!
//! # Data Flow
//! ```text
//! Shutdown::subscribe → TopologyRefresher / binary watch loop
//! Ctrl-C or caller → Shutdown::trigger → tasks leave their loops
//! ```

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownSignal};
