//! The transport orchestrator.
//!
//! # Responsibilities
//! - Run the per-request retry loop over the connection pool
//! - Encode request bodies and decode responses
//! - Trigger topology refreshes (start, every N requests, on failure,
//!   periodically) and apply them to the pool
//!
//! # Design Decisions
//! - Cheap to clone; all clones share one pool
//! - Only one sniff runs at a time; concurrent triggers are skipped
//! - Sniff failures are logged and never fail a request

use axum::http::HeaderValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::connection::{
    Connection, ConnectionError, Host, REQUEST_ID_HEADER, RawRequest, RawResponse,
};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::pool::{ConnectionPool, RebuildSummary};
use crate::serializer::Serializer;
use crate::sniffer::{SniffError, Sniffer, TopologyRefresher};
use crate::transport::error::TransportError;
use crate::transport::request::{Request, Response};
use crate::transport::retry::RetryState;

/// When to refresh the topology.
#[derive(Debug, Clone, Default)]
pub(crate) struct SniffSettings {
    pub on_start: bool,
    pub after_requests: Option<u64>,
    pub on_connection_fail: bool,
    pub interval: Option<Duration>,
}

#[derive(Debug)]
struct Inner {
    pool: Arc<dyn ConnectionPool>,
    sniffer: Arc<dyn Sniffer>,
    serializer: Arc<dyn Serializer>,
    max_retries: Option<u32>,
    sniff: SniffSettings,
    request_count: AtomicU64,
    started: OnceCell<()>,
    sniffing: AtomicBool,
}

/// Client-side transport over a cluster of interchangeable nodes.
#[derive(Debug, Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

/// Clears the single-flight flag when a sniff ends, however it ends.
struct SniffGuard<'a>(&'a AtomicBool);

impl Drop for SniffGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Transport {
    pub(crate) fn from_parts(
        pool: Arc<dyn ConnectionPool>,
        sniffer: Arc<dyn Sniffer>,
        serializer: Arc<dyn Serializer>,
        max_retries: Option<u32>,
        sniff: SniffSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                pool,
                sniffer,
                serializer,
                max_retries,
                sniff,
                request_count: AtomicU64::new(0),
                started: OnceCell::new(),
                sniffing: AtomicBool::new(false),
            }),
        }
    }

    pub fn pool(&self) -> &dyn ConnectionPool {
        self.inner.pool.as_ref()
    }

    pub fn serializer(&self) -> &dyn Serializer {
        self.inner.serializer.as_ref()
    }

    /// Hosts of the current connection set, in pool order.
    pub fn hosts(&self) -> Vec<Host> {
        self.inner
            .pool
            .connections()
            .iter()
            .map(|c| c.host().clone())
            .collect()
    }

    /// Logical requests issued so far.
    pub fn request_count(&self) -> u64 {
        self.inner.request_count.load(Ordering::Relaxed)
    }

    /// Retries allowed per request; defaults to the current pool size.
    pub fn max_retries(&self) -> u32 {
        self.inner.max_retries.unwrap_or_else(|| {
            u32::try_from(self.inner.pool.connections().len()).unwrap_or(u32::MAX)
        })
    }

    /// Execute a logical request against the cluster.
    pub async fn perform_request(&self, request: Request) -> Result<Response, TransportError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "perform_request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.path()
        );
        self.perform(request, request_id).instrument(span).await
    }

    async fn perform(&self, request: Request, request_id: Uuid) -> Result<Response, TransportError> {
        let start = Instant::now();
        self.ensure_started().await;
        self.count_request();

        let raw = match self.encode(&request, request_id) {
            Ok(raw) => raw,
            Err(e) => {
                metrics::record_request(e.kind(), start);
                return Err(e);
            }
        };

        let mut retry = RetryState::new(self.max_retries());
        loop {
            let connection = match self.inner.pool.next_connection(retry.tried()) {
                Ok(connection) => connection,
                Err(_) => {
                    let known = self.inner.pool.connections().len();
                    tracing::error!(
                        known,
                        attempts = retry.attempts_made(),
                        "No alive connections available"
                    );
                    let err = TransportError::NoConnectionsAvailable {
                        known,
                        attempts: retry.into_failures(),
                    };
                    metrics::record_request(err.kind(), start);
                    return Err(err);
                }
            };

            let attempt = retry.begin_attempt();
            match connection.execute(raw.clone()).await {
                Ok(response) => {
                    self.inner.pool.report_success(connection.as_ref());
                    metrics::record_attempt(connection.host(), "success");
                    tracing::debug!(
                        host = %connection.host(),
                        attempt,
                        status = %response.status,
                        "Request completed"
                    );
                    let result = self.decode(response, connection.as_ref(), attempt);
                    metrics::record_request(
                        match &result {
                            Ok(_) => "success",
                            Err(e) => e.kind(),
                        },
                        start,
                    );
                    return result;
                }
                Err(ConnectionError::ResponseTooLarge { limit }) => {
                    // The node answered; it stays alive and the request is not retried.
                    self.inner.pool.report_success(connection.as_ref());
                    metrics::record_attempt(connection.host(), "response_too_large");
                    let err = TransportError::ResponseTooLarge {
                        host: connection.host().clone(),
                        limit,
                    };
                    tracing::warn!(error = %err, attempt, "Response body over limit");
                    metrics::record_request(err.kind(), start);
                    return Err(err);
                }
                Err(error) => {
                    tracing::warn!(
                        host = %connection.host(),
                        attempt,
                        error = %error,
                        "Connection attempt failed"
                    );
                    metrics::record_attempt(connection.host(), error.kind());
                    self.inner.pool.report_failure(connection.as_ref());
                    retry.record_failure(connection.host().clone(), error);

                    if retry.exhausted() {
                        let err = TransportError::RetriesExhausted {
                            attempts: retry.into_failures(),
                        };
                        tracing::error!(error = %err, "Retries exhausted");
                        metrics::record_request(err.kind(), start);
                        return Err(err);
                    }

                    if self.inner.sniff.on_connection_fail {
                        if let Err(e) = self.sniff().await {
                            tracing::debug!(error = %e, "Sniff after connection failure left topology unchanged");
                        }
                    }
                }
            }
        }
    }

    fn encode(&self, request: &Request, request_id: Uuid) -> Result<RawRequest, TransportError> {
        let mut raw = RawRequest::new(request.method().clone(), request.path_and_query()?);
        raw.headers = request.headers().clone();
        let id = HeaderValue::from_str(&request_id.to_string())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        raw.headers.insert(REQUEST_ID_HEADER, id);

        if let Some(body) = request.body_value() {
            let (bytes, content_type) = self.inner.serializer.serialize(body)?;
            raw = raw.with_body(bytes, content_type);
        }
        Ok(raw)
    }

    fn decode(
        &self,
        response: RawResponse,
        connection: &dyn Connection,
        attempts: u32,
    ) -> Result<Response, TransportError> {
        let body = self
            .inner
            .serializer
            .deserialize(&response.body, response.content_type())?;
        Ok(Response {
            status: response.status,
            headers: response.headers,
            body,
            host: connection.host().clone(),
            attempts,
        })
    }

    async fn ensure_started(&self) {
        if !self.inner.sniff.on_start {
            return;
        }
        self.inner
            .started
            .get_or_init(|| async {
                match self.sniff().await {
                    Ok(summary) => {
                        tracing::info!(nodes = summary.retained.len() + summary.added.len(), "Initial sniff complete")
                    }
                    Err(e) => tracing::warn!(error = %e, "Initial sniff failed, using seed hosts"),
                }
            })
            .await;
    }

    fn count_request(&self) {
        let count = self.inner.request_count.fetch_add(1, Ordering::Relaxed) + 1;
        let Some(every) = self.inner.sniff.after_requests else {
            return;
        };
        if every > 0 && count % every == 0 {
            let transport = self.clone();
            tokio::spawn(async move {
                match transport.sniff().await {
                    Ok(_) | Err(SniffError::InProgress) => {}
                    Err(e) => tracing::warn!(error = %e, "Scheduled sniff failed, keeping current topology"),
                }
            });
        }
    }

    /// Query the cluster for its membership and rebuild the pool from it.
    ///
    /// Tries each alive connection in pool order until one answers. On any
    /// failure the current topology is kept.
    pub async fn sniff(&self) -> Result<RebuildSummary, SniffError> {
        if !self.inner.pool.accepts_sniffed_topology() {
            return Err(SniffError::Disabled);
        }
        if self.inner.sniffing.swap(true, Ordering::AcqRel) {
            return Err(SniffError::InProgress);
        }
        let _guard = SniffGuard(&self.inner.sniffing);

        let candidates = self.inner.pool.alive_connections();
        if candidates.is_empty() {
            metrics::record_sniff("no_connections");
            return Err(SniffError::NoConnectionsAvailable);
        }

        let mut last_error = SniffError::NoConnectionsAvailable;
        for connection in candidates {
            match self.inner.sniffer.sniff(connection.as_ref()).await {
                Ok(hosts) => {
                    let summary = self.inner.pool.rebuild(&hosts);
                    metrics::record_sniff("success");
                    return Ok(summary);
                }
                Err(e) => {
                    tracing::warn!(host = %connection.host(), error = %e, "Sniff attempt failed");
                    last_error = e;
                }
            }
        }
        metrics::record_sniff("failure");
        Err(last_error)
    }

    /// Replace the host list explicitly (for example after a config reload).
    pub fn rebuild(&self, hosts: &[Host]) -> RebuildSummary {
        self.inner.pool.rebuild(hosts)
    }

    /// Spawn the periodic refresher if an interval is configured.
    pub fn spawn_refresher(&self, shutdown: &Shutdown) -> Option<JoinHandle<()>> {
        let interval = self.inner.sniff.interval?;
        let refresher = TopologyRefresher::new(self.clone(), interval);
        let rx = shutdown.subscribe();
        Some(tokio::spawn(refresher.run(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionFactory;
    use std::collections::HashSet;
    use crate::transport::TransportBuilder;
    use axum::http::{HeaderMap, StatusCode};
    use futures_util::future::BoxFuture;
    use hyper::body::Bytes;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted node behaviour.
    #[derive(Debug, Clone, Copy)]
    enum Behaviour {
        Succeed,
        Fail,
        Status(u16),
        TooLarge,
    }

    #[derive(Debug, Default)]
    struct Cluster {
        behaviour: Mutex<HashMap<String, Behaviour>>,
        executions: Mutex<Vec<String>>,
        nodes_info: Mutex<Option<String>>,
    }

    impl Cluster {
        fn set(&self, host: &str, behaviour: Behaviour) {
            self.behaviour.lock().unwrap().insert(host.to_string(), behaviour);
        }

        fn executions(&self) -> Vec<String> {
            self.executions.lock().unwrap().clone()
        }
    }

    #[derive(Debug)]
    struct ScriptedConnection {
        host: Host,
        cluster: Arc<Cluster>,
    }

    impl Connection for ScriptedConnection {
        fn host(&self) -> &Host {
            &self.host
        }

        fn execute(&self, request: RawRequest) -> BoxFuture<'_, Result<RawResponse, ConnectionError>> {
            Box::pin(async move {
                let name = self.host.to_string();
                if request.path_and_query.path() == "/_nodes/_all/http" {
                    let body = self.cluster.nodes_info.lock().unwrap().clone();
                    return match body {
                        Some(body) => Ok(raw(200, body)),
                        None => Err(ConnectionError::Connect("sniff refused".into())),
                    };
                }
                self.cluster.executions.lock().unwrap().push(name.clone());
                let behaviour = self
                    .cluster
                    .behaviour
                    .lock()
                    .unwrap()
                    .get(&name)
                    .copied()
                    .unwrap_or(Behaviour::Succeed);
                match behaviour {
                    Behaviour::Succeed => Ok(raw(200, format!(r#"{{"node":"{}"}}"#, name))),
                    Behaviour::Status(code) => Ok(raw(code, r#"{"error":"boom"}"#.to_string())),
                    Behaviour::Fail => Err(ConnectionError::Connect(format!("{} refused", name))),
                    Behaviour::TooLarge => Err(ConnectionError::ResponseTooLarge { limit: 64 }),
                }
            })
        }
    }

    fn raw(status: u16, body: String) -> RawResponse {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: Bytes::from(body),
        }
    }

    #[derive(Debug)]
    struct ScriptedFactory {
        cluster: Arc<Cluster>,
    }

    impl ConnectionFactory for ScriptedFactory {
        fn create(&self, host: &Host) -> Result<Arc<dyn Connection>, ConnectionError> {
            Ok(Arc::new(ScriptedConnection {
                host: host.clone(),
                cluster: self.cluster.clone(),
            }))
        }
    }

    fn transport(hosts: &[&str], cluster: &Arc<Cluster>) -> TransportBuilder {
        TransportBuilder::new(hosts.iter().copied())
            .randomize_hosts(false)
            .connection_factory(Arc::new(ScriptedFactory {
                cluster: cluster.clone(),
            }))
    }

    #[tokio::test]
    async fn test_failover_to_healthy_node() {
        let cluster = Arc::new(Cluster::default());
        cluster.set("a:9200", Behaviour::Fail);
        let t = transport(&["a:9200", "b:9200"], &cluster)
            .max_retries(1)
            .build()
            .unwrap();

        let response = t.perform_request(Request::get("/")).await.unwrap();
        assert_eq!(response.host.to_string(), "b:9200");
        assert_eq!(response.attempts, 2);
        assert_eq!(response.body, json!({"node": "b:9200"}));
        assert_eq!(cluster.executions(), vec!["a:9200", "b:9200"]);
        assert_eq!(t.pool().dead_pool().dead_hosts(), vec!["a:9200".parse::<Host>().unwrap()]);
    }

    #[tokio::test]
    async fn test_all_nodes_fail() {
        let cluster = Arc::new(Cluster::default());
        cluster.set("a:9200", Behaviour::Fail);
        cluster.set("b:9200", Behaviour::Fail);
        let t = transport(&["a:9200", "b:9200"], &cluster)
            .max_retries(1)
            .build()
            .unwrap();

        let err = t.perform_request(Request::get("/")).await.unwrap_err();
        match &err {
            TransportError::RetriesExhausted { attempts } => {
                let hosts: Vec<String> = attempts.iter().map(|a| a.host.to_string()).collect();
                assert_eq!(hosts, vec!["a:9200", "b:9200"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cluster.executions().len(), 2);
    }

    #[tokio::test]
    async fn test_attempts_bounded_by_max_retries() {
        let cluster = Arc::new(Cluster::default());
        for h in ["a", "b", "c", "d"] {
            cluster.set(h, Behaviour::Fail);
        }
        let t = transport(&["a", "b", "c", "d"], &cluster)
            .max_retries(2)
            .build()
            .unwrap();

        let err = t.perform_request(Request::get("/")).await.unwrap_err();
        assert_eq!(err.attempts().len(), 3);
        let executed = cluster.executions();
        let unique: HashSet<_> = executed.iter().collect();
        assert_eq!(unique.len(), 3, "no node tried twice while others were untried");
    }

    #[tokio::test]
    async fn test_exhausted_pool_fails_without_attempts() {
        let cluster = Arc::new(Cluster::default());
        let t = transport(&["a", "b"], &cluster).build().unwrap();
        for conn in t.pool().connections().iter() {
            t.pool().report_failure(conn.as_ref());
        }

        let err = t.perform_request(Request::get("/")).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::NoConnectionsAvailable { known: 2, ref attempts } if attempts.is_empty()
        ));
        assert!(cluster.executions().is_empty());
    }

    #[tokio::test]
    async fn test_single_node_failure_stops_when_pool_exhausted() {
        let cluster = Arc::new(Cluster::default());
        cluster.set("a", Behaviour::Fail);
        let t = transport(&["a"], &cluster).max_retries(3).build().unwrap();

        let err = t.perform_request(Request::get("/")).await.unwrap_err();
        match err {
            TransportError::NoConnectionsAvailable { attempts, .. } => assert_eq!(attempts.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let cluster = Arc::new(Cluster::default());
        cluster.set("a", Behaviour::Status(503));
        let t = transport(&["a", "b"], &cluster).build().unwrap();

        let response = t.perform_request(Request::get("/")).await.unwrap();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body, json!({"error": "boom"}));
        assert_eq!(response.attempts, 1);
        assert!(t.pool().dead_pool().dead_hosts().is_empty());
    }

    fn nodes_info(addresses: &[&str]) -> Option<String> {
        let nodes: serde_json::Map<String, serde_json::Value> = addresses
            .iter()
            .enumerate()
            .map(|(i, a)| (format!("node-{i}"), json!({"http": {"publish_address": a}})))
            .collect();
        Some(json!({ "nodes": nodes }).to_string())
    }

    #[tokio::test]
    async fn test_oversized_response_is_not_a_node_failure() {
        let cluster = Arc::new(Cluster::default());
        cluster.set("a", Behaviour::TooLarge);
        cluster.set("b", Behaviour::TooLarge);
        let t = transport(&["a", "b"], &cluster).build().unwrap();

        let err = t.perform_request(Request::get("/_search")).await.unwrap_err();
        match err {
            TransportError::ResponseTooLarge { host, limit } => {
                assert_eq!(host.to_string(), "a");
                assert_eq!(limit, 64);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cluster.executions(), vec!["a"]);
        assert!(t.pool().dead_pool().dead_hosts().is_empty());

        cluster.set("b", Behaviour::Succeed);
        let response = t.perform_request(Request::get("/")).await.unwrap();
        assert_eq!(response.host.to_string(), "b");
    }

    #[tokio::test]
    async fn test_sniff_rebuilds_pool_and_keeps_dead_state() {
        let cluster = Arc::new(Cluster::default());
        let t = transport(&["a:9200", "b:9200"], &cluster).build().unwrap();
        let a_conn = t.pool().connections()[0].clone();
        let b_conn = t.pool().connections()[1].clone();
        t.pool().report_failure(b_conn.as_ref());
        *cluster.nodes_info.lock().unwrap() = nodes_info(&["a:9200", "c:9300"]);

        let summary = t.sniff().await.unwrap();
        assert_eq!(summary.removed, vec!["b:9200".parse::<Host>().unwrap()]);
        assert_eq!(summary.added, vec!["c:9300".parse::<Host>().unwrap()]);
        let hosts: Vec<String> = t.hosts().iter().map(ToString::to_string).collect();
        assert_eq!(hosts, vec!["a:9200", "c:9300"]);
        assert!(Arc::ptr_eq(&t.pool().connections()[0], &a_conn));
        assert!(t.pool().dead_pool().dead_hosts().is_empty());

        // A kept host keeps its dead state across a rebuild.
        t.pool().report_failure(a_conn.as_ref());
        t.sniff().await.unwrap();
        assert_eq!(t.pool().dead_pool().dead_hosts(), vec!["a:9200".parse::<Host>().unwrap()]);
    }

    #[tokio::test]
    async fn test_failed_sniff_keeps_topology() {
        let cluster = Arc::new(Cluster::default());
        let t = transport(&["a", "b"], &cluster).build().unwrap();

        assert!(t.sniff().await.is_err());
        *cluster.nodes_info.lock().unwrap() = Some(r#"{"nodes":{}}"#.to_string());
        assert!(matches!(t.sniff().await, Err(SniffError::NoNodes)));

        let hosts: Vec<String> = t.hosts().iter().map(ToString::to_string).collect();
        assert_eq!(hosts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_static_pool_rejects_sniff() {
        let cluster = Arc::new(Cluster::default());
        let t = transport(&["a"], &cluster)
            .connection_pool(crate::config::ConnectionPoolKind::Static)
            .build()
            .unwrap();
        assert!(matches!(t.sniff().await, Err(SniffError::Disabled)));
    }

    #[tokio::test]
    async fn test_sniff_on_connection_fail() {
        let cluster = Arc::new(Cluster::default());
        cluster.set("a:9200", Behaviour::Fail);
        cluster.set("b:9200", Behaviour::Fail);
        *cluster.nodes_info.lock().unwrap() = nodes_info(&["a:9200", "b:9200", "c:9200"]);
        let t = transport(&["a:9200", "b:9200"], &cluster)
            .sniff_on_connection_fail(true)
            .max_retries(2)
            .build()
            .unwrap();

        let response = t.perform_request(Request::get("/")).await.unwrap();
        assert_eq!(response.host.to_string(), "c:9200");
        assert_eq!(t.hosts().len(), 3);
    }

    #[tokio::test]
    async fn test_sniff_on_start_runs_once() {
        let cluster = Arc::new(Cluster::default());
        *cluster.nodes_info.lock().unwrap() = nodes_info(&["x:9200"]);
        let t = transport(&["a:9200"], &cluster).sniff_on_start(true).build().unwrap();

        let response = t.perform_request(Request::get("/")).await.unwrap();
        assert_eq!(response.host.to_string(), "x:9200");

        *cluster.nodes_info.lock().unwrap() = nodes_info(&["y:9200"]);
        let response = t.perform_request(Request::get("/")).await.unwrap();
        assert_eq!(response.host.to_string(), "x:9200");
    }

    #[tokio::test]
    async fn test_sniff_after_requests() {
        let cluster = Arc::new(Cluster::default());
        *cluster.nodes_info.lock().unwrap() = nodes_info(&["a:9200", "z:9200"]);
        let t = transport(&["a:9200"], &cluster)
            .sniff_after_requests(Some(2))
            .build()
            .unwrap();

        t.perform_request(Request::get("/")).await.unwrap();
        assert_eq!(t.hosts().len(), 1);
        t.perform_request(Request::get("/")).await.unwrap();
        assert_eq!(t.request_count(), 2);

        for _ in 0..50 {
            if t.hosts().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(t.hosts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_sniffs_each_interval_until_shutdown() {
        let cluster = Arc::new(Cluster::default());
        *cluster.nodes_info.lock().unwrap() = nodes_info(&["a:9200", "z:9200"]);
        let t = transport(&["a:9200"], &cluster)
            .sniff_interval(Some(Duration::from_secs(30)))
            .build()
            .unwrap();
        let shutdown = Shutdown::new();
        let handle = t.spawn_refresher(&shutdown).unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(t.hosts().len(), 1);

        tokio::time::sleep(Duration::from_secs(21)).await;
        let hosts: Vec<String> = t.hosts().iter().map(ToString::to_string).collect();
        assert_eq!(hosts, vec!["a:9200", "z:9200"]);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("refresher exits on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_refresher_without_interval() {
        let cluster = Arc::new(Cluster::default());
        let t = transport(&["a"], &cluster).build().unwrap();
        assert!(t.spawn_refresher(&Shutdown::new()).is_none());
    }

    #[tokio::test]
    async fn test_in_flight_request_survives_rebuild() {
        let cluster = Arc::new(Cluster::default());
        let t = transport(&["a:9200"], &cluster).build().unwrap();
        let conn = t.pool().next_connection(&HashSet::new()).unwrap();

        t.rebuild(&["b:9200".parse().unwrap()]);
        assert_eq!(t.hosts(), vec!["b:9200".parse::<Host>().unwrap()]);

        let raw = RawRequest::new(axum::http::Method::GET, "/".parse().unwrap());
        let response = conn.execute(raw).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_is_serialized_with_request_id() {
        #[derive(Debug, Default)]
        struct Capture(Mutex<Option<RawRequest>>);

        #[derive(Debug)]
        struct CaptureConnection(Host, Arc<Capture>);

        impl Connection for CaptureConnection {
            fn host(&self) -> &Host {
                &self.0
            }

            fn execute(&self, request: RawRequest) -> BoxFuture<'_, Result<RawResponse, ConnectionError>> {
                *self.1.0.lock().unwrap() = Some(request);
                Box::pin(async { Ok(raw(201, String::new())) })
            }
        }

        #[derive(Debug)]
        struct CaptureFactory(Arc<Capture>);

        impl ConnectionFactory for CaptureFactory {
            fn create(&self, host: &Host) -> Result<Arc<dyn Connection>, ConnectionError> {
                Ok(Arc::new(CaptureConnection(host.clone(), self.0.clone())))
            }
        }

        let capture = Arc::new(Capture::default());
        let t = TransportBuilder::new(["a"])
            .connection_factory(Arc::new(CaptureFactory(capture.clone())))
            .build()
            .unwrap();

        let response = t
            .perform_request(Request::post("/idx/_doc", json!({"k": 1})).param("refresh", "true"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body, serde_json::Value::Null);

        let sent = capture.0.lock().unwrap().take().unwrap();
        assert_eq!(sent.path_and_query.as_str(), "/idx/_doc?refresh=true");
        assert_eq!(sent.body.unwrap(), Bytes::from_static(br#"{"k":1}"#));
        assert!(sent.headers.contains_key(REQUEST_ID_HEADER));
        assert_eq!(sent.headers["content-type"], "application/json");
    }
}
