//! In-memory ring buffer sink.
//!
//! # Responsibilities
//! - Keep the newest `capacity` records, dropping the oldest
//! - Let tests and diagnostics tooling read records back

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::level::Level;
use crate::sink::{Record, Sink, SinkError};

pub const DEFAULT_CAPACITY: usize = 1024;

/// Bounded buffer of recently accepted records.
#[derive(Debug)]
pub struct MemorySink {
    capacity: usize,
    records: Mutex<VecDeque<Record>>,
}

impl MemorySink {
    /// Create a buffer holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of buffered records, oldest first.
    pub fn records(&self) -> Vec<Record> {
        self.lock().iter().cloned().collect()
    }

    /// Snapshot of buffered `(level, text)` pairs, oldest first.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.lock()
            .iter()
            .map(|r| (r.level, r.text.clone()))
            .collect()
    }

    /// Take all buffered records, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Record> {
        self.lock().drain(..).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Record>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Sink for MemorySink {
    fn accept(&self, record: &Record) -> Result<(), SinkError> {
        let mut records = self.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
