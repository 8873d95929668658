//! Configuration file watcher for hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::configurator::CascadingConfigurator;
use crate::system::LoggingSystem;

/// Monitors the files of a cascade and reloads all of them on change.
pub struct ConfigWatcher {
    paths: Vec<PathBuf>,
    update_tx: mpsc::UnboundedSender<CascadingConfigurator>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for reloaded cascades.
    pub fn new(paths: &[PathBuf]) -> (Self, mpsc::UnboundedReceiver<CascadingConfigurator>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                paths: paths.to_vec(),
                update_tx,
            },
            update_rx,
        )
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Start watching in a background thread. Keep the returned watcher alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let paths = self.paths.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(paths = ?event.paths, "Config file change detected, reloading");
                        match CascadingConfigurator::from_paths(&paths) {
                            Ok(cascade) => {
                                let _ = tx.send(cascade);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload config, keeping current topology");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for path in &self.paths {
            watcher.watch(Path::new(path), RecursiveMode::NonRecursive)?;
        }

        tracing::info!(paths = ?self.paths, "Config watcher started");
        Ok(watcher)
    }
}

/// Apply every reloaded cascade until the sender side is dropped.
pub async fn reload_loop(
    system: Arc<LoggingSystem>,
    mut updates: mpsc::UnboundedReceiver<CascadingConfigurator>,
) {
    while let Some(cascade) = updates.recv().await {
        let result = system.configure(&cascade);
        if result.has_error {
            tracing::error!(message = %result.message, "Reload rejected");
        } else {
            tracing::info!(message = %result.message, "Reload applied");
        }
    }
    tracing::debug!("Reload loop finished");
}
