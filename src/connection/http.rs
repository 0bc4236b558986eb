//! HTTP connection on top of hyper-util's pooled client.
//!
//! # Responsibilities
//! - Turn a `RawRequest` into a hyper request against one node
//! - Enforce the per-attempt deadline
//! - Classify failures into `ConnectionError`
//!
//! # Design Decisions
//! - One `Client` per factory; every connection holds a clone of it, so
//!   keep-alive sockets are pooled across the whole transport and released
//!   when the last connection and the factory are dropped.
//! - Connection parameters are an opaque map; keys this module does not know
//!   are ignored.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Uri};
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use hyper::body::Bytes;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use url::Url;

use crate::connection::{
    Connection, ConnectionError, ConnectionFactory, Host, REQUEST_ID_HEADER, RawRequest, RawResponse,
};

/// Parameters understood by the HTTP connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConnectionParams {
    /// Whole-attempt deadline in seconds.
    pub timeout_secs: u64,

    /// TCP connect deadline in seconds.
    pub connect_timeout_secs: u64,

    /// Upper bound on a buffered response body.
    pub max_response_bytes: usize,

    /// Idle keep-alive sockets kept per node.
    pub pool_max_idle_per_host: usize,

    /// Headers added to every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConnectionParams {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 5,
            max_response_bytes: 100 * 1024 * 1024,
            pool_max_idle_per_host: 32,
            headers: BTreeMap::new(),
        }
    }
}

impl HttpConnectionParams {
    const KNOWN: [&'static str; 5] = [
        "timeout_secs",
        "connect_timeout_secs",
        "max_response_bytes",
        "pool_max_idle_per_host",
        "headers",
    ];

    /// Extract the HTTP parameters from the opaque connection parameter map.
    pub fn from_params(
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, serde_json::Error> {
        for key in params.keys() {
            if !Self::KNOWN.contains(&key.as_str()) {
                tracing::debug!(param = %key, "Connection parameter not used by the HTTP connection");
            }
        }
        let known: serde_json::Map<_, _> = params
            .iter()
            .filter(|(k, _)| Self::KNOWN.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(serde_json::Value::Object(known))
    }
}

/// Factory owning the shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConnectionFactory {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_response_bytes: usize,
    default_headers: Arc<HeaderMap>,
}

impl HttpConnectionFactory {
    pub fn new(params: HttpConnectionParams) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(params.connect_timeout_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(params.pool_max_idle_per_host)
            .build(connector);

        let mut default_headers = HeaderMap::new();
        for (name, value) in &params.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(n), Ok(v)) => {
                    default_headers.insert(n, v);
                }
                _ => tracing::warn!(header = %name, "Ignoring invalid default header"),
            }
        }

        Self {
            client,
            timeout: Duration::from_secs(params.timeout_secs),
            max_response_bytes: params.max_response_bytes,
            default_headers: Arc::new(default_headers),
        }
    }
}

impl Default for HttpConnectionFactory {
    fn default() -> Self {
        Self::new(HttpConnectionParams::default())
    }
}

impl ConnectionFactory for HttpConnectionFactory {
    fn create(&self, host: &Host) -> Result<Arc<dyn Connection>, ConnectionError> {
        let base_url = host
            .base_url()
            .map_err(|e| ConnectionError::Connect(format!("invalid base URL for {}: {}", host, e)))?;
        Ok(Arc::new(HttpConnection {
            host: host.clone(),
            base_url,
            client: self.client.clone(),
            timeout: self.timeout,
            max_response_bytes: self.max_response_bytes,
            default_headers: self.default_headers.clone(),
        }))
    }
}

/// A connection to one node over HTTP/1.1.
#[derive(Debug)]
pub struct HttpConnection {
    host: Host,
    /// Pre-calculated base URL.
    base_url: Url,
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_response_bytes: usize,
    default_headers: Arc<HeaderMap>,
}

impl HttpConnection {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn uri_for(&self, request: &RawRequest) -> Result<Uri, ConnectionError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{}{}", base, request.path_and_query)
            .parse::<Uri>()
            .map_err(|e| ConnectionError::Io(format!("invalid request URI: {}", e)))
    }

    /// Buffer a response body, refusing to grow past `max_response_bytes`.
    async fn read_body(&self, body: Body) -> Result<Bytes, ConnectionError> {
        let mut stream = body.into_data_stream();
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ConnectionError::Body(e.to_string()))?;
            if buf.len() + chunk.len() > self.max_response_bytes {
                return Err(ConnectionError::ResponseTooLarge {
                    limit: self.max_response_bytes,
                });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(buf))
    }

    async fn send(&self, request: RawRequest) -> Result<RawResponse, ConnectionError> {
        let uri = self.uri_for(&request)?;
        let mut builder = Request::builder().method(request.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            for (k, v) in self.default_headers.iter() {
                headers.insert(k.clone(), v.clone());
            }
            for (k, v) in request.headers.iter() {
                headers.insert(k.clone(), v.clone());
            }
        }
        let req = builder
            .body(request.body.map(Body::from).unwrap_or_else(Body::empty))
            .map_err(|e| ConnectionError::Io(e.to_string()))?;

        let response = self.client.request(req).await.map_err(|e| {
            if e.is_connect() {
                ConnectionError::Connect(e.to_string())
            } else {
                ConnectionError::Io(e.to_string())
            }
        })?;

        let (parts, body) = response.into_parts();
        let body = self.read_body(Body::new(body)).await?;

        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

impl Connection for HttpConnection {
    fn host(&self) -> &Host {
        &self.host
    }

    fn execute(&self, request: RawRequest) -> BoxFuture<'_, Result<RawResponse, ConnectionError>> {
        Box::pin(async move {
            let request_id = request
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            tracing::trace!(
                host = %self.host,
                request_id = %request_id,
                method = %request.method,
                path = %request.path_and_query,
                "Sending request"
            );

            match time::timeout(self.timeout, self.send(request)).await {
                Ok(result) => result,
                Err(_) => Err(ConnectionError::Timeout(self.timeout)),
            }
        })
    }
}
