//! Transport subsystem: the single entry point used by API layers.
//!
//! # Data Flow
//! ```text
//! perform_request(Request)
//!     → sniff on start (once, before the first request)
//!     → serializer encodes the body          → RawRequest
//!     → retry loop (retry.rs):
//!         pool.next_connection(tried)
//!         → connection.execute
//!         → success: report_success, decode   → Response
//!         → failure: report_failure, record attempt,
//!                    optional sniff, next attempt
//!     → NoConnectionsAvailable / RetriesExhausted with every attempt listed
//!
//! Every N requests: background sniff → pool.rebuild
//! ```
//!
//! # Design Decisions
//! - At most `max_retries + 1` attempts per logical request
//! - Untried nodes are preferred; repeats only once alternatives run out
//! - Selection is lock-free; no lock is held across `execute`
//! - Application error statuses are successful completions

pub mod builder;
pub mod client;
pub mod error;
pub mod request;
pub mod retry;

pub use builder::TransportBuilder;
pub use client::Transport;
pub use error::{AttemptFailure, TransportError};
pub use request::{Request, Response};
pub use retry::RetryState;
