//! Logger handles.
//!
//! # Responsibilities
//! - Hold the cached effective `(level, sink)` pair of one logger
//! - Filter, format and deliver records on the caller's thread
//! - Apply per-logger level/sink overrides
//!
//! # Design Decisions
//! - The cache is an `ArcSwap`, so dispatch never takes a lock
//! - Overrides and the group binding sit behind a mutex that is only touched
//!   by refreshes, which are themselves serialized by the system update lock
//! - A refresh never rewrites the binding: a group or sink missing from the
//!   new topology only affects the cached pair, so it comes back with them
//! - Sink failures and panics end up in the delivery side channel

use arc_swap::{ArcSwap, Guard};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::level::Level;
use crate::sink::{NullSink, Record, Sink, SinkError};
use crate::system::{lock, LogError, Shared};
use crate::topology::Topology;

/// Binding and runtime overrides of one logger.
#[derive(Debug)]
struct Binding {
    group: Arc<str>,
    level: Option<Level>,
    sink: Option<String>,
}

/// What the dispatch path reads.
#[derive(Debug)]
struct Cached {
    level: Level,
    group: Arc<str>,
    sink_name: Arc<str>,
    sink: Arc<dyn Sink>,
}

#[derive(Debug)]
struct LoggerInner {
    name: Arc<str>,
    binding: Mutex<Binding>,
    cache: ArcSwap<Cached>,
    shared: Arc<Shared>,
}

/// Cheaply cloneable handle to a named logger.
#[derive(Debug, Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    pub(crate) fn new(name: &str, group: &str, shared: Arc<Shared>, topology: &Topology) -> Self {
        let logger = Self {
            inner: Arc::new(LoggerInner {
                name: Arc::from(name),
                binding: Mutex::new(Binding {
                    group: Arc::from(group),
                    level: None,
                    sink: None,
                }),
                cache: ArcSwap::from_pointee(silent(Arc::from(group))),
                shared,
            }),
        };
        logger.refresh(topology);
        logger
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Group the active topology resolves this logger through.
    ///
    /// Differs from the registered group only while that group is missing.
    pub fn group(&self) -> String {
        self.inner.cache.load().group.to_string()
    }

    pub fn effective_level(&self) -> Level {
        self.inner.cache.load().level
    }

    /// Name of the sink records currently go to.
    pub fn effective_sink(&self) -> String {
        self.inner.cache.load().sink_name.to_string()
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.inner.cache.load().level.is_enabled_for(level)
    }

    /// Log an already formatted message.
    ///
    /// Arguments are evaluated by the caller even when `level` is filtered;
    /// use [`Logger::log_with`] or the `log_*!` macros to defer that work.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        let cached = self.inner.cache.load();
        if !cached.level.is_enabled_for(level) {
            return;
        }
        self.deliver(Guard::into_inner(cached), level, message.to_string());
    }

    /// Log a message built only if `level` is enabled.
    pub fn log_with<F>(&self, level: Level, build: F)
    where
        F: FnOnce() -> String,
    {
        let cached = self.inner.cache.load();
        if !cached.level.is_enabled_for(level) {
            return;
        }
        self.deliver(Guard::into_inner(cached), level, build());
    }

    pub fn critical(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Critical, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn verbose(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Verbose, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }

    /// Override the group's level for this logger only.
    pub fn set_level(&self, level: Level) {
        self.update(|binding, _| {
            binding.level = Some(level);
            Ok(())
        })
        .ok();
    }

    /// Go back to the group's effective level.
    pub fn reset_level(&self) {
        self.update(|binding, _| {
            binding.level = None;
            Ok(())
        })
        .ok();
    }

    /// Send this logger's records to `sink` instead of the group's sink.
    pub fn set_sink(&self, sink: &str) -> Result<(), LogError> {
        self.update(|binding, topology| {
            let topology = topology.ok_or(LogError::NotConfigured)?;
            if topology.sinks().find(sink).is_none() {
                return Err(LogError::UnknownSink(sink.to_string()));
            }
            binding.sink = Some(sink.to_string());
            Ok(())
        })
    }

    /// Go back to the group's effective sink.
    pub fn reset_sink(&self) {
        self.update(|binding, _| {
            binding.sink = None;
            Ok(())
        })
        .ok();
    }

    /// Mutate the binding under the system update lock, then re-derive.
    fn update<F>(&self, change: F) -> Result<(), LogError>
    where
        F: FnOnce(&mut Binding, Option<&Topology>) -> Result<(), LogError>,
    {
        let _update = lock(&self.inner.shared.update);
        let topology = self.inner.shared.topology.load_full();
        change(&mut self.binding(), topology.as_deref())?;
        if let Some(topology) = topology {
            self.refresh(&topology);
        }
        Ok(())
    }

    fn binding(&self) -> MutexGuard<'_, Binding> {
        lock(&self.inner.binding)
    }

    /// Re-derive the cached pair from `topology` and the overrides.
    ///
    /// The binding itself is never rewritten: a group missing from this
    /// topology falls back to the root and a missing override sink to the
    /// group's sink, until a topology brings them back.
    pub(crate) fn refresh(&self, topology: &Topology) {
        let binding = self.binding();
        let groups = topology.groups();

        let group = match groups.find(&binding.group) {
            Some(id) => id,
            None => {
                tracing::warn!(
                    logger = %self.inner.name,
                    group = %binding.group,
                    root = topology.root_name(),
                    "Logger group does not exist, falling back to root"
                );
                groups.root()
            }
        };
        let resolved = topology.resolved(group);

        let sink = match binding.sink.as_deref() {
            Some(name) => topology.sinks().find(name).unwrap_or_else(|| {
                tracing::warn!(
                    logger = %self.inner.name,
                    sink = %name,
                    "Sink override does not exist, using group sink"
                );
                resolved.sink
            }),
            None => resolved.sink,
        };

        self.inner.cache.store(Arc::new(Cached {
            level: binding.level.unwrap_or(resolved.level),
            group: Arc::from(groups.name(group)),
            sink_name: Arc::from(topology.sinks().name(sink)),
            sink: topology.sinks().get(sink).clone(),
        }));
    }

    /// Drop every record until the next refresh.
    pub(crate) fn silence(&self) {
        let group = self.binding().group.clone();
        self.inner.cache.store(Arc::new(silent(group)));
    }

    fn deliver(&self, cached: Arc<Cached>, level: Level, text: String) {
        let record = Record::new(self.inner.name.clone(), level, text);
        let sink = &cached.sink;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| sink.accept(&record)))
            .unwrap_or_else(|payload| Err(SinkError::Panicked(panic_message(payload.as_ref()))));
        if let Err(e) = outcome {
            self.inner.shared.delivery.record(&cached.sink_name, &e);
        }
    }
}

fn silent(group: Arc<str>) -> Cached {
    Cached {
        level: Level::Off,
        group,
        sink_name: Arc::from("null"),
        sink: Arc::new(NullSink),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ConfigDocument, GroupDecl, SinkDecl};
    use crate::configurator::DocumentConfigurator;
    use crate::sink::MemorySink;
    use crate::system::LoggingSystem;

    fn system() -> LoggingSystem {
        let system = LoggingSystem::new();
        let result = system.configure(&DocumentConfigurator::new(
            ConfigDocument::new()
                .with_sink(SinkDecl::memory("mem", 16))
                .with_sink(SinkDecl::memory("audit", 16))
                .with_sink(SinkDecl::new("nowhere", crate::config::schema::SinkKind::Null))
                .with_group(
                    GroupDecl::new("main")
                        .level(Level::Info)
                        .sink("mem")
                        .child(GroupDecl::new("net").level(Level::Warn))
                        .child(GroupDecl::new("sec").sink("audit")),
                )
                .with_group(GroupDecl::new("unused").sink("nowhere")),
        ));
        assert!(!result.has_error, "{}", result.message);
        system
    }

    fn memory(system: &LoggingSystem, name: &str) -> Arc<dyn Sink> {
        system.sink(name).unwrap()
    }

    fn entries(sink: &Arc<dyn Sink>) -> Vec<(Level, String)> {
        sink.as_any().downcast_ref::<MemorySink>().unwrap().entries()
    }

    #[test]
    fn test_filtering_by_group_level() {
        let system = system();
        let logger = system.get_logger("net.client", "net").unwrap();
        logger.error(format_args!("boom {}", 1));
        logger.info(format_args!("filtered"));

        assert_eq!(
            entries(&memory(&system, "mem")),
            vec![(Level::Error, "boom 1".to_string())]
        );
        assert!(logger.is_enabled(Level::Warn));
        assert!(!logger.is_enabled(Level::Info));
        assert!(!logger.is_enabled(Level::Off));
    }

    #[test]
    fn test_log_with_skips_builder_when_disabled() {
        let system = system();
        let logger = system.get_logger("x", "main").unwrap();
        let mut built = false;
        logger.log_with(Level::Debug, || {
            built = true;
            "never".to_string()
        });
        assert!(!built);
        logger.log_with(Level::Info, || "built".to_string());
        assert_eq!(entries(&memory(&system, "mem")).len(), 1);
    }

    #[test]
    fn test_level_override_and_reset() {
        let system = system();
        let logger = system.get_logger("x", "net").unwrap();
        logger.set_level(Level::Trace);
        assert_eq!(logger.effective_level(), Level::Trace);
        logger.reset_level();
        assert_eq!(logger.effective_level(), Level::Warn);
    }

    #[test]
    fn test_sink_override_and_reset() {
        let system = system();
        let logger = system.get_logger("x", "main").unwrap();
        logger.set_sink("audit").unwrap();
        assert_eq!(logger.effective_sink(), "audit");
        logger.info(format_args!("to audit"));
        assert_eq!(entries(&memory(&system, "audit")).len(), 1);
        assert!(entries(&memory(&system, "mem")).is_empty());

        let err = logger.set_sink("missing").unwrap_err();
        assert!(matches!(err, LogError::UnknownSink(ref s) if s == "missing"));
        assert_eq!(logger.effective_sink(), "audit");

        logger.reset_sink();
        assert_eq!(logger.effective_sink(), "mem");
    }

    #[test]
    fn test_record_carries_logger_name() {
        let system = system();
        let logger = system.get_logger("sec.auth", "sec").unwrap();
        logger.warn(format_args!("denied"));
        let sink = memory(&system, "audit");
        let records = sink.as_any().downcast_ref::<MemorySink>().unwrap().records();
        assert_eq!(&*records[0].logger, "sec.auth");
        assert_eq!(logger.group(), "sec");
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }
}
