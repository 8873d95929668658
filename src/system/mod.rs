//! Logging system: active topology, logger handles, runtime changes.
//!
//! # Responsibilities
//! - Run configurators and activate the resulting topology atomically
//! - Hand out logger handles bound to groups
//! - Apply runtime group changes and keep every handle's cache current
//! - Collect sink delivery failures on a side channel
//!
//! # Data Flow
//! ```text
//! configure(configurator)
//!     → TopologyBuilder → finalize → Topology
//!     → ArcSwapOption::store (new records see the new topology)
//!     → LoggerTable::refresh_all (every handle re-derived before return)
//!
//! Logger::log(level, ..)
//!     → cached (level, sink) load, no locks
//!     → Sink::accept → failures → DeliveryTracker + metrics
//! ```
//!
//! # Design Decisions
//! - No global instance; applications own a `LoggingSystem` (usually in an `Arc`)
//! - All writers (configure, group changes, logger overrides) share one mutex
//! - A failed configure leaves the previous topology untouched

pub mod logger;
pub mod table;

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::configurator::Configurator;
use crate::level::Level;
use crate::observability::metrics;
use crate::sink::{Sink, SinkError};
use crate::topology::{ConfigurationError, Diagnostics, GroupId, GroupTree, SinkTable, Topology, TopologyBuilder};

pub use logger::Logger;
pub use table::LoggerTable;

/// Errors from runtime operations on a configured system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error("logging system is not configured")]
    NotConfigured,

    #[error("unknown logger group '{0}'")]
    UnknownGroup(String),

    #[error("unknown sink '{0}'")]
    UnknownSink(String),

    /// The root must keep an explicit level, sink and no parent.
    #[error("operation not allowed on root group '{0}'")]
    RootGroup(String),

    #[error("group change would create a cycle: {0}")]
    Cycle(String),

    #[error("resulting topology is invalid: {0}")]
    InvalidTopology(String),
}

/// Outcome of [`LoggingSystem::configure`].
#[derive(Debug, Clone)]
pub struct ConfigureResult {
    pub has_error: bool,
    /// Operator-facing summary followed by every diagnostic.
    pub message: String,
    pub diagnostics: Diagnostics,
}

/// Snapshot of the delivery side channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub failures: u64,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct DeliveryTracker {
    failures: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl DeliveryTracker {
    pub(crate) fn record(&self, sink: &str, error: &SinkError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        *lock(&self.last_error) = Some(format!("sink '{}': {}", sink, error));
        metrics::record_sink_error(sink);
    }

    fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            failures: self.failures.load(Ordering::Relaxed),
            last_error: lock(&self.last_error).clone(),
        }
    }
}

/// State shared between the system and its logger handles.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) topology: ArcSwapOption<Topology>,
    /// Serializes every writer of `topology` and of logger bindings.
    pub(crate) update: Mutex<()>,
    pub(crate) delivery: DeliveryTracker,
}

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Default)]
pub struct LoggingSystem {
    shared: Arc<Shared>,
    loggers: LoggerTable,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a topology from `configurator` and activate it.
    ///
    /// All or nothing: with any error the active topology (or the
    /// unconfigured state) is kept.
    pub fn configure(&self, configurator: &dyn Configurator) -> ConfigureResult {
        let mut builder = TopologyBuilder::new();
        let mut diagnostics = configurator.configure(&mut builder);
        let topology = builder.finalize(&mut diagnostics);

        let topology = match topology {
            Some(topology) if !diagnostics.has_errors() => topology,
            _ => {
                metrics::record_configure(false);
                tracing::error!(
                    errors = diagnostics.error_count(),
                    "Configuration rejected, keeping previous topology"
                );
                return ConfigureResult {
                    has_error: true,
                    message: format!(
                        "configuration failed with {} error(s):\n{}",
                        diagnostics.error_count(),
                        diagnostics
                    ),
                    diagnostics,
                };
            }
        };

        let mut message = format!(
            "configured root '{}' with {} group(s) and {} sink(s)",
            topology.root_name(),
            topology.groups().len(),
            topology.sinks().len()
        );
        if !diagnostics.is_empty() {
            message.push_str(&format!("\n{}", diagnostics));
        }

        tracing::info!(
            root = topology.root_name(),
            groups = topology.groups().len(),
            sinks = topology.sinks().len(),
            warnings = diagnostics.len(),
            "Topology activated"
        );

        {
            let _update = lock(&self.shared.update);
            self.activate(Arc::new(topology));
        }
        metrics::record_configure(true);

        ConfigureResult {
            has_error: false,
            message,
            diagnostics,
        }
    }

    /// Swap in `topology` and re-derive every logger. Caller holds `update`.
    fn activate(&self, topology: Arc<Topology>) {
        self.shared.topology.store(Some(topology.clone()));
        self.loggers.refresh_all(&topology);
    }

    pub fn is_configured(&self) -> bool {
        self.shared.topology.load().is_some()
    }

    /// The active topology, if any.
    pub fn topology(&self) -> Option<Arc<Topology>> {
        self.shared.topology.load_full()
    }

    /// Handle for logger `name` bound to `group`.
    ///
    /// A name that is already registered returns the existing handle and
    /// keeps its original binding.
    pub fn get_logger(&self, name: &str, group: &str) -> Result<Logger, LogError> {
        if !self.is_configured() {
            return Err(LogError::NotConfigured);
        }
        if let Some(logger) = self.loggers.get(name) {
            return Ok(logger);
        }

        let _update = lock(&self.shared.update);
        let topology = self.topology().ok_or(LogError::NotConfigured)?;
        let id = topology
            .groups()
            .find(group)
            .ok_or_else(|| LogError::UnknownGroup(group.to_string()))?;
        let bound = topology.groups().name(id).to_string();

        // Creation is serialized by the update lock, so a handle registered
        // since the fast-path check can only come from this same section.
        if let Some(logger) = self.loggers.get(name) {
            return Ok(logger);
        }
        let logger = Logger::new(name, &bound, self.shared.clone(), &topology);
        let logger = self.loggers.get_or_insert(name, logger);
        tracing::debug!(logger = %name, group = %bound, "Logger registered");
        metrics::record_logger_count(self.loggers.len());
        Ok(logger)
    }

    /// Registered handle for `name`, if any.
    pub fn logger(&self, name: &str) -> Option<Logger> {
        self.loggers.get(name)
    }

    /// Names of every registered logger, sorted.
    pub fn loggers(&self) -> Vec<String> {
        self.loggers.names()
    }

    pub fn sink(&self, name: &str) -> Option<Arc<dyn Sink>> {
        self.topology()?.sink(name).cloned()
    }

    pub fn set_group_level(&self, group: &str, level: Level) -> Result<(), LogError> {
        self.mutate_groups(|groups, _| {
            let id = find_group(groups, group)?;
            groups.set_level(id, Some(level));
            Ok(())
        })
    }

    /// Make `group` inherit its level again. Not allowed on the root.
    pub fn reset_group_level(&self, group: &str) -> Result<(), LogError> {
        self.mutate_groups(|groups, _| {
            let id = find_non_root(groups, group)?;
            groups.set_level(id, None);
            Ok(())
        })
    }

    pub fn set_group_sink(&self, group: &str, sink: &str) -> Result<(), LogError> {
        self.mutate_groups(|groups, sinks| {
            let id = find_group(groups, group)?;
            let sink = sinks
                .find(sink)
                .ok_or_else(|| LogError::UnknownSink(sink.to_string()))?;
            groups.set_sink(id, Some(sink));
            Ok(())
        })
    }

    /// Make `group` inherit its sink again. Not allowed on the root.
    pub fn reset_group_sink(&self, group: &str) -> Result<(), LogError> {
        self.mutate_groups(|groups, _| {
            let id = find_non_root(groups, group)?;
            groups.set_sink(id, None);
            Ok(())
        })
    }

    /// Move `group` under `parent`.
    pub fn set_group_parent(&self, group: &str, parent: &str) -> Result<(), LogError> {
        self.mutate_groups(|groups, _| {
            let id = find_non_root(groups, group)?;
            let parent = find_group(groups, parent)?;
            groups.set_parent(id, parent).map_err(|e| match e {
                ConfigurationError::Cycle(path) => LogError::Cycle(path),
                other => LogError::InvalidTopology(other.to_string()),
            })
        })
    }

    /// Copy the active group tree, apply `change`, re-resolve and activate.
    fn mutate_groups<F>(&self, change: F) -> Result<(), LogError>
    where
        F: FnOnce(&mut GroupTree, &SinkTable) -> Result<(), LogError>,
    {
        let _update = lock(&self.shared.update);
        let current = self.topology().ok_or(LogError::NotConfigured)?;
        let mut groups = current.groups().clone();
        change(&mut groups, current.sinks())?;

        let next = current.with_groups(groups).map_err(|errors| {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            LogError::InvalidTopology(joined.join("; "))
        })?;
        tracing::debug!("Group tree changed at runtime");
        self.activate(Arc::new(next));
        Ok(())
    }

    pub fn delivery_stats(&self) -> DeliveryStats {
        self.shared.delivery.stats()
    }

    /// Flush every sink of the active topology.
    pub fn flush(&self) {
        if let Some(topology) = self.topology() {
            for (_, name, sink) in topology.sinks().iter() {
                if let Err(e) = sink.flush() {
                    self.shared.delivery.record(name, &e);
                }
            }
        }
    }

    /// Flush, deactivate and silence every logger.
    ///
    /// A later successful `configure` re-activates existing handles.
    pub fn shutdown(&self) {
        let _update = lock(&self.shared.update);
        self.flush();
        self.shared.topology.store(None);
        self.loggers.silence_all();
        tracing::info!(loggers = self.loggers.len(), "Logging system shut down");
    }
}

fn find_group(groups: &GroupTree, name: &str) -> Result<GroupId, LogError> {
    groups
        .find(name)
        .ok_or_else(|| LogError::UnknownGroup(name.to_string()))
}

fn find_non_root(groups: &GroupTree, name: &str) -> Result<GroupId, LogError> {
    let id = find_group(groups, name)?;
    if id == groups.root() {
        return Err(LogError::RootGroup(groups.name(id).to_string()));
    }
    Ok(id)
}
