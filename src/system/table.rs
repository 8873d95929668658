//! Concurrent table of logger handles keyed by logger name.

use dashmap::DashMap;

use crate::system::logger::Logger;
use crate::topology::Topology;

#[derive(Debug, Default)]
pub struct LoggerTable {
    loggers: DashMap<String, Logger>,
}

impl LoggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Logger> {
        self.loggers.get(name).map(|entry| entry.value().clone())
    }

    /// Existing handle for `name`, or `logger` if none is registered yet.
    ///
    /// The first registration fixes the binding; later calls only fetch.
    /// `logger` is built by the caller so no user code runs under the map lock.
    pub fn get_or_insert(&self, name: &str, logger: Logger) -> Logger {
        self.loggers
            .entry(name.to_string())
            .or_insert(logger)
            .value()
            .clone()
    }

    /// Re-derive every cached level/sink pair against `topology`.
    pub(crate) fn refresh_all(&self, topology: &Topology) {
        for entry in self.loggers.iter() {
            entry.value().refresh(topology);
        }
    }

    /// Make every handle a no-op until the next refresh.
    pub(crate) fn silence_all(&self) {
        for entry in self.loggers.iter() {
            entry.value().silence();
        }
    }

    /// Registered logger names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}
