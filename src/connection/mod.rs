//! Connection subsystem.
//!
//! # Data Flow
//! ```text
//! Host descriptor (host.rs)
//!     → ConnectionFactory::create (one Connection per node)
//!     → Connection::execute(RawRequest)
//!         - Ok(RawResponse)        any status, 4xx/5xx included
//!         - Err(ConnectionError)   network-level failure only
//! ```
//!
//! # Design Decisions
//! - A connection never retries; retry policy lives in the transport.
//! - Application-level error statuses are responses, not failures.
//! - Transport-wide I/O resources (the HTTP client and its socket pool) are
//!   owned by the factory and shared by reference with every connection.

pub mod host;
pub mod http;

use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header, uri::PathAndQuery};
use futures_util::future::BoxFuture;
use hyper::body::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use host::{Host, HostParseError, DEFAULT_PORT};
pub use http::{HttpConnection, HttpConnectionFactory, HttpConnectionParams};

/// Network-level failure of a single attempt.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Could not establish a connection (refused, unreachable, DNS).
    #[error("connect error: {0}")]
    Connect(String),

    /// The attempt did not complete within the configured deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Connection reset or protocol failure mid-exchange.
    #[error("I/O error: {0}")]
    Io(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The node answered, but with a body over the configured limit.
    #[error("response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
}

impl ConnectionError {
    /// Static label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionError::Connect(_) => "connect",
            ConnectionError::Timeout(_) => "timeout",
            ConnectionError::Io(_) => "io",
            ConnectionError::Body(_) => "body",
            ConnectionError::ResponseTooLarge { .. } => "response_too_large",
        }
    }
}

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// An encoded request, ready to be sent to any node.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub path_and_query: PathAndQuery,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RawRequest {
    /// A body-less request.
    pub fn new(method: Method, path_and_query: PathAndQuery) -> Self {
        Self {
            method,
            path_and_query,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Attach an encoded body and its content type.
    pub fn with_body(mut self, body: Bytes, content_type: &'static str) -> Self {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = Some(body);
        self
    }
}

/// The undecoded answer of a node.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// One node endpoint able to execute requests.
pub trait Connection: Send + Sync + fmt::Debug {
    /// The node this connection talks to.
    fn host(&self) -> &Host;

    /// Execute one attempt. Must be safe to call repeatedly and concurrently.
    fn execute(&self, request: RawRequest) -> BoxFuture<'_, Result<RawResponse, ConnectionError>>;
}

/// Builds connections for hosts; owns any resource the connections share.
pub trait ConnectionFactory: Send + Sync + fmt::Debug {
    fn create(&self, host: &Host) -> Result<Arc<dyn Connection>, ConnectionError>;
}
