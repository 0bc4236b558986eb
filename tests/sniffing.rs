//! Topology discovery against real HTTP nodes.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use cluster_transport::{Request, SniffError, TransportBuilder};

mod common;

/// A node that serves `nodes_info` on the sniff path and its name elsewhere.
async fn sniffable_node(name: &'static str, published: Arc<Mutex<Vec<SocketAddr>>>) -> SocketAddr {
    common::start_programmable_node(move |seen| {
        let published = published.clone();
        async move {
            if seen.target == "/_nodes/_all/http" {
                let addrs = published.lock().unwrap().clone();
                (200, common::nodes_info(&addrs))
            } else {
                (200, format!(r#"{{"node":"{name}"}}"#))
            }
        }
    })
    .await
}

fn hosts(transport: &cluster_transport::Transport) -> Vec<String> {
    transport.hosts().iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_sniff_replaces_topology() {
    let published = Arc::new(Mutex::new(Vec::new()));
    let a = sniffable_node("a", published.clone()).await;
    let b = common::closed_port().await;
    let c = common::start_named_node("c").await;
    *published.lock().unwrap() = vec![a, c];

    let transport = TransportBuilder::new([a.to_string(), b.to_string()])
        .randomize_hosts(false)
        .build()
        .unwrap();

    let summary = transport.sniff().await.unwrap();
    assert_eq!(summary.retained.len(), 1);
    assert_eq!(summary.added.len(), 1);
    assert_eq!(summary.removed.len(), 1);
    assert_eq!(hosts(&transport), vec![a.to_string(), c.to_string()]);

    let mut served = Vec::new();
    for _ in 0..2 {
        let response = transport.perform_request(Request::get("/")).await.unwrap();
        served.push(response.body["node"].as_str().unwrap().to_string());
    }
    served.sort();
    assert_eq!(served, vec!["a", "c"]);
}

#[tokio::test]
async fn test_sniff_on_start_uses_discovered_nodes() {
    let published = Arc::new(Mutex::new(Vec::new()));
    let seed = sniffable_node("seed", published.clone()).await;
    let discovered = common::start_named_node("discovered").await;
    *published.lock().unwrap() = vec![discovered];

    let transport = TransportBuilder::new([seed.to_string()])
        .sniff_on_start(true)
        .build()
        .unwrap();

    let response = transport.perform_request(Request::get("/")).await.unwrap();
    assert_eq!(response.body["node"], "discovered");
    assert_eq!(hosts(&transport), vec![discovered.to_string()]);
}

#[tokio::test]
async fn test_sniff_on_connection_fail_finds_new_node() {
    let published = Arc::new(Mutex::new(Vec::new()));
    let seed = sniffable_node("seed", published.clone()).await;
    let gone = common::closed_port().await;
    let fresh = common::start_named_node("fresh").await;
    *published.lock().unwrap() = vec![seed, fresh];

    let transport = TransportBuilder::new([gone.to_string(), seed.to_string()])
        .randomize_hosts(false)
        .sniff_on_connection_fail(true)
        .build()
        .unwrap();

    let response = transport.perform_request(Request::get("/")).await.unwrap();
    assert_eq!(response.attempts, 2);
    assert!(!hosts(&transport).contains(&gone.to_string()));
    assert!(hosts(&transport).contains(&fresh.to_string()));
}

#[tokio::test]
async fn test_failed_sniff_keeps_topology() {
    let node = common::start_programmable_node(|seen| async move {
        if seen.target == "/_nodes/_all/http" {
            (503, r#"{"error":"unavailable"}"#.to_string())
        } else {
            (200, r#"{"node":"a"}"#.to_string())
        }
    })
    .await;

    let transport = TransportBuilder::new([node.to_string()]).build().unwrap();

    let err = transport.sniff().await.unwrap_err();
    assert!(matches!(err, SniffError::Status(503)));
    assert_eq!(hosts(&transport), vec![node.to_string()]);

    let response = transport.perform_request(Request::get("/")).await.unwrap();
    assert_eq!(response.body["node"], "a");
}
