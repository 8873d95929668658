//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use grouplog::config::schema::ConfigDocument;
use grouplog::sink::MemorySink;
use grouplog::topology::SinkSpec;
use grouplog::{Configurator, Diagnostics, Level, LoggingSystem, Record, Sink, SinkError, TopologyBuilder};

/// Registers ready-made sink instances, then applies a document on top.
#[derive(Debug)]
pub struct InstanceConfigurator {
    pub sinks: Vec<(String, Arc<dyn Sink>)>,
    pub document: ConfigDocument,
}

impl InstanceConfigurator {
    pub fn new(document: ConfigDocument) -> Self {
        Self {
            sinks: Vec::new(),
            document,
        }
    }

    pub fn with_sink(mut self, name: &str, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push((name.to_string(), sink));
        self
    }
}

impl Configurator for InstanceConfigurator {
    fn configure(&self, builder: &mut TopologyBuilder) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        builder.begin_layer();
        for (name, sink) in &self.sinks {
            if let Err(e) = builder.register_sink(name, SinkSpec::Instance(sink.clone())) {
                diagnostics.error(e);
            }
        }
        diagnostics.extend(builder.apply_document(&self.document));
        diagnostics
    }
}

/// Fails every delivery with an I/O error.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub calls: AtomicUsize,
}

impl Sink for FailingSink {
    fn accept(&self, _record: &Record) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::other("disk full").into())
    }

    fn kind(&self) -> &'static str {
        "failing"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Panics on every delivery.
#[derive(Debug, Default)]
pub struct PanickingSink;

impl Sink for PanickingSink {
    fn accept(&self, _record: &Record) -> Result<(), SinkError> {
        panic!("sink exploded");
    }

    fn kind(&self) -> &'static str {
        "panicking"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Configure `system`, panicking with the diagnostics on failure.
pub fn configure_ok(system: &LoggingSystem, configurator: &dyn Configurator) {
    let result = system.configure(configurator);
    assert!(!result.has_error, "unexpected configuration failure:\n{}", result.message);
}

/// `(level, text)` pairs held by the memory sink `name`.
pub fn memory_entries(system: &LoggingSystem, name: &str) -> Vec<(Level, String)> {
    let sink = system
        .sink(name)
        .unwrap_or_else(|| panic!("no sink named '{}'", name));
    sink.as_any()
        .downcast_ref::<MemorySink>()
        .unwrap_or_else(|| panic!("sink '{}' is not a memory sink", name))
        .entries()
}
