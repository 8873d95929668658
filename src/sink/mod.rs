//! Sink subsystem.
//!
//! # Data Flow
//! ```text
//! Logger (enabled call)
//!     → Record { logger, level, text, timestamp, thread }
//!     → effective sink: accept(&record)
//!         - console.rs (stdout / stderr, optional color)
//!         - file.rs (buffered append)
//!         - multi.rs (fan-out to other sinks)
//!         - memory.rs (ring buffer of recent records)
//!         - NullSink (discard)
//!     → Err(SinkError) goes to the delivery side channel, never to the caller
//! ```
//!
//! # Design Decisions
//! - Delivery is synchronous; buffering/async workers are a sink concern
//! - Sinks synchronize their own I/O; the core only shares `Arc<dyn Sink>`
//! - Sinks are immutable once a topology is finalized

pub mod console;
pub mod file;
pub mod memory;
pub mod multi;

use chrono::{DateTime, Local};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;

use crate::level::Level;

pub use console::{ConsoleSink, ConsoleStream};
pub use file::FileSink;
pub use memory::MemorySink;
pub use multi::MultiSink;

/// A formatted log record handed to a sink.
#[derive(Debug, Clone)]
pub struct Record {
    /// Name of the emitting logger.
    pub logger: Arc<str>,
    pub level: Level,
    /// Fully formatted message text.
    pub text: String,
    pub timestamp: SystemTime,
    /// Name of the emitting thread, if it has one.
    pub thread: Option<String>,
}

impl Record {
    /// Build a record stamped with the current time and thread.
    pub fn new(logger: Arc<str>, level: Level, text: String) -> Self {
        Self {
            logger,
            level,
            text,
            timestamp: SystemTime::now(),
            thread: std::thread::current().name().map(str::to_owned),
        }
    }

    /// Render as a single line: `time  thread  level  logger  text`.
    pub fn render(&self, color: bool) -> String {
        let time = DateTime::<Local>::from(self.timestamp).format("%y.%m.%d %H:%M:%S%.6f");
        let thread = self.thread.as_deref().unwrap_or("-");
        if color {
            format!(
                "{}  {:<12}  {}{:<8}\x1b[0m  {}  {}",
                time,
                thread,
                level_color(self.level),
                self.level.as_str(),
                self.logger,
                self.text
            )
        } else {
            format!(
                "{}  {:<12}  {:<8}  {}  {}",
                time,
                thread,
                self.level.as_str(),
                self.logger,
                self.text
            )
        }
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Off => "",
        Level::Critical => "\x1b[1;31m",
        Level::Error => "\x1b[31m",
        Level::Warn => "\x1b[33m",
        Level::Info => "\x1b[32m",
        Level::Verbose => "\x1b[36m",
        Level::Debug => "\x1b[34m",
        Level::Trace => "\x1b[90m",
    }
}

/// Errors a sink may report for a single delivery.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Some members of a fan-out sink failed.
    #[error("{failed} of {total} fan-out sinks failed; first error: {first}")]
    Fanout {
        failed: usize,
        total: usize,
        first: Box<SinkError>,
    },

    /// The sink panicked while accepting a record.
    #[error("sink panicked: {0}")]
    Panicked(String),
}

/// Output destination capable of accepting a rendered record.
pub trait Sink: Send + Sync + fmt::Debug + 'static {
    /// Deliver one record.
    fn accept(&self, record: &Record) -> Result<(), SinkError>;

    /// Flush any buffered records.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Short kind tag (`console`, `file`, ...), used in reports.
    fn kind(&self) -> &'static str;

    /// Downcasting helper, e.g. to read back a [`MemorySink`].
    fn as_any(&self) -> &dyn Any;
}

/// Sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn accept(&self, _record: &Record) -> Result<(), SinkError> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "null"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: Level, text: &str) -> Record {
        Record::new(Arc::from("main"), level, text.to_string())
    }

    #[test]
    fn test_render_plain_contains_fields() {
        let line = record(Level::Warn, "disk almost full").render(false);
        assert!(line.contains("Warning"));
        assert!(line.contains("main"));
        assert!(line.ends_with("disk almost full"));
        assert!(!line.contains('\x1b'));
    }

    #[test]
    fn test_render_color_wraps_level() {
        let line = record(Level::Error, "boom").render(true);
        assert!(line.contains("\x1b[31mError"));
        assert!(line.contains("\x1b[0m"));
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullSink;
        assert!(sink.accept(&record(Level::Trace, "x")).is_ok());
        assert!(sink.flush().is_ok());
        assert_eq!(sink.kind(), "null");
    }

    #[test]
    fn test_fanout_error_message() {
        let err = SinkError::Fanout {
            failed: 1,
            total: 3,
            first: Box::new(SinkError::Panicked("bad".into())),
        };
        assert_eq!(
            err.to_string(),
            "1 of 3 fan-out sinks failed; first error: sink panicked: bad"
        );
    }
}
