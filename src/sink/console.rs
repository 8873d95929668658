//! Console sink.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::io::{self, Write};

use crate::sink::{Record, Sink, SinkError};

/// Standard stream a console sink writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    #[default]
    Stdout,
    Stderr,
}

/// Writes one rendered line per record to stdout or stderr.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    color: bool,
    stream: ConsoleStream,
}

impl ConsoleSink {
    pub fn new(color: bool, stream: ConsoleStream) -> Self {
        Self { color, stream }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(false, ConsoleStream::Stdout)
    }
}

impl Sink for ConsoleSink {
    fn accept(&self, record: &Record) -> Result<(), SinkError> {
        let line = record.render(self.color);
        // Locking the stream keeps a record's line from interleaving with others.
        match self.stream {
            ConsoleStream::Stdout => writeln!(io::stdout().lock(), "{}", line)?,
            ConsoleStream::Stderr => writeln!(io::stderr().lock(), "{}", line)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().flush()?,
            ConsoleStream::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "console"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
