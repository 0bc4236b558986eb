//! `cluster-transport`: drive the transport from the command line.
//!
//! ```text
//! cluster-transport --config transport.toml request --method GET --path /_cluster/health
//! cluster-transport --host a:9200 --host b:9200 sniff
//! cluster-transport --config transport.toml watch
//! ```

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use cluster_transport::config::{ConfigWatcher, TransportConfig, load_config};
use cluster_transport::lifecycle::Shutdown;
use cluster_transport::observability::{logging, metrics};
use cluster_transport::{Host, Request, Transport, TransportBuilder};

#[derive(Parser)]
#[command(name = "cluster-transport")]
#[command(about = "Send requests to a cluster through the failover transport", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed host; replaces the configured hosts when given.
    #[arg(long = "host")]
    hosts: Vec<String>,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform one request and print the response
    Request {
        #[arg(short, long, default_value = "GET")]
        method: String,
        #[arg(short, long)]
        path: String,
        /// Query parameter as key=value
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// JSON body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Sniff the cluster once and print the discovered hosts
    Sniff,
    /// Keep the topology fresh until Ctrl-C
    Watch,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TransportConfig::default(),
    };
    if !cli.hosts.is_empty() {
        config.hosts = cli.hosts.clone();
    }

    logging::init(&config.logging)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cluster-transport starting");

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let seeds = Host::parse_all(&config.hosts)?;
    let transport = TransportBuilder::from_config(config).build()?;

    match cli.command {
        Commands::Request {
            method,
            path,
            params,
            body,
        } => {
            let method = method.to_uppercase().parse()?;
            let mut request = Request::new(method, path);
            for (key, value) in params {
                request = request.param(key, value);
            }
            if let Some(body) = body {
                request = request.body(serde_json::from_str(&body)?);
            }

            let response = transport.perform_request(request).await?;
            eprintln!(
                "{} from {} after {} attempt(s)",
                response.status, response.host, response.attempts
            );
            println!("{}", serde_json::to_string_pretty(&response.body)?);
        }
        Commands::Sniff => {
            let summary = transport.sniff().await?;
            tracing::info!(
                added = summary.added.len(),
                removed = summary.removed.len(),
                "Sniff complete"
            );
            for host in transport.hosts() {
                println!("{host}");
            }
        }
        Commands::Watch => watch(transport, seeds, cli.config).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn watch(
    transport: Transport,
    seeds: Vec<Host>,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    let refresher = transport.spawn_refresher(&shutdown);
    if refresher.is_none() {
        tracing::warn!("No sniff interval configured, only config reloads will change the topology");
    }

    let (updates, _watcher) = match config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(&path, seeds);
            (Some(rx), Some(watcher.run()?))
        }
        None => (None, None),
    };
    let mut updates = updates;

    loop {
        tokio::select! {
            Some(hosts) = async {
                match updates.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                let summary = transport.rebuild(&hosts);
                tracing::info!(
                    added = summary.added.len(),
                    removed = summary.removed.len(),
                    "Host list reloaded from config"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }

    shutdown.trigger();
    if let Some(handle) = refresher {
        handle.await?;
    }
    Ok(())
}
