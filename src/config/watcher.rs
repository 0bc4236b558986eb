//! Hot reload of the seed host list.
//!
//! Only `hosts` is live-reloadable: the other settings shape the transport
//! when it is built. A reload that leaves the host list as it was, or that
//! fails to load, produces nothing.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::connection::Host;

/// Re-reads the config file and reports host list changes.
#[derive(Debug)]
pub struct HostListReloader {
    path: PathBuf,
    current: Vec<Host>,
}

impl HostListReloader {
    pub fn new(path: &Path, current: Vec<Host>) -> Self {
        Self {
            path: path.to_path_buf(),
            current,
        }
    }

    /// The new host list if the file now names a different one.
    pub fn reload(&mut self) -> Option<Vec<Host>> {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Config reload failed, keeping current hosts");
                return None;
            }
        };
        let hosts = match Host::parse_all(&config.hosts) {
            Ok(hosts) => hosts,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Reloaded host list is invalid");
                return None;
            }
        };
        if hosts == self.current {
            tracing::debug!(path = ?self.path, "Config changed, host list did not");
            return None;
        }
        self.current = hosts.clone();
        Some(hosts)
    }
}

/// Watches the config file and emits new host lists.
pub struct ConfigWatcher {
    reloader: HostListReloader,
    update_tx: mpsc::UnboundedSender<Vec<Host>>,
}

impl ConfigWatcher {
    /// `current` is the host list the transport was built with.
    pub fn new(path: &Path, current: Vec<Host>) -> (Self, mpsc::UnboundedReceiver<Vec<Host>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                reloader: HostListReloader::new(path, current),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            mut reloader,
            update_tx,
        } = self;
        let path = reloader.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(hosts) = reloader.reload() {
                        tracing::info!(hosts = hosts.len(), "Host list changed on disk");
                        let _ = update_tx.send(hosts);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cluster-transport-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reload_reports_only_host_changes() {
        let path = temp_config(r#"hosts = ["a:9200", "b:9200"]"#);
        let mut reloader = HostListReloader::new(&path, Host::parse_all(&["a:9200", "b:9200"]).unwrap());

        // Other settings changed, hosts did not.
        fs::write(&path, "hosts = [\"a:9200\", \"b:9200\"]\nmax_retries = 5\n").unwrap();
        assert!(reloader.reload().is_none());

        fs::write(&path, r#"hosts = ["a:9200", "c:9200"]"#).unwrap();
        assert_eq!(
            reloader.reload(),
            Some(Host::parse_all(&["a:9200", "c:9200"]).unwrap())
        );
        assert!(reloader.reload().is_none());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_reload_keeps_current_hosts() {
        let path = temp_config(r#"hosts = ["a:9200"]"#);
        let mut reloader = HostListReloader::new(&path, Host::parse_all(&["a:9200"]).unwrap());

        fs::write(&path, r#"hosts = ["a:"]"#).unwrap();
        assert!(reloader.reload().is_none());
        fs::write(&path, "hosts = [\"a:9200\"]\nunknown_key = 1\n").unwrap();
        assert!(reloader.reload().is_none());

        fs::write(&path, r#"hosts = ["b:9200"]"#).unwrap();
        assert_eq!(reloader.reload(), Some(Host::parse_all(&["b:9200"]).unwrap()));

        fs::remove_file(&path).unwrap();
    }
}
