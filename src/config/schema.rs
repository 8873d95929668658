//! Configuration document schema.
//!
//! This is the generic, already-parsed document a configurator consumes. All
//! types derive Serde traits so documents can come from TOML or JSON files.
//!
//! ```toml
//! [[sinks]]
//! name = "console"
//! type = "console"
//! color = true
//!
//! [[groups]]
//! name = "main"
//! sink = "console"
//! level = "trace"
//!
//! [[groups.children]]
//! name = "main.child"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::level::Level;
use crate::sink::memory::DEFAULT_CAPACITY;
use crate::sink::ConsoleStream;

/// One declarative configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigDocument {
    /// Sink declarations, applied before any group.
    pub sinks: Vec<SinkDecl>,

    /// Group declarations, applied depth-first in document order.
    pub groups: Vec<GroupDecl>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: SinkDecl) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_group(mut self, group: GroupDecl) -> Self {
        self.groups.push(group);
        self
    }
}

/// A named sink declaration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SinkDecl {
    /// Unique sink name, referenced by groups.
    pub name: String,

    /// Kind and kind-specific parameters (`type = "..."`).
    #[serde(flatten)]
    pub kind: SinkKind,
}

impl SinkDecl {
    pub fn new(name: impl Into<String>, kind: SinkKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn console(name: impl Into<String>, color: bool) -> Self {
        Self::new(
            name,
            SinkKind::Console {
                color,
                stream: ConsoleStream::Stdout,
            },
        )
    }

    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name, SinkKind::File { path: path.into() })
    }

    pub fn memory(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, SinkKind::Memory { capacity })
    }

    pub fn multisink<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            SinkKind::Multisink {
                sinks: members.into_iter().map(Into::into).collect(),
            },
        )
    }
}

/// Supported sink kinds with their parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkKind {
    /// Standard output or error.
    Console {
        #[serde(default)]
        color: bool,
        #[serde(default)]
        stream: ConsoleStream,
    },

    /// Append to a file.
    File { path: PathBuf },

    /// Forward to other sinks by name.
    Multisink { sinks: Vec<String> },

    /// Keep the newest records in memory.
    Memory {
        #[serde(default = "default_memory_capacity")]
        capacity: usize,
    },

    /// Discard everything.
    Null,
}

impl SinkKind {
    pub fn tag(&self) -> &'static str {
        match self {
            SinkKind::Console { .. } => "console",
            SinkKind::File { .. } => "file",
            SinkKind::Multisink { .. } => "multisink",
            SinkKind::Memory { .. } => "memory",
            SinkKind::Null => "null",
        }
    }
}

fn default_memory_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// A group declaration, possibly with nested children.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GroupDecl {
    /// Unique group name.
    pub name: String,

    /// Explicit parent. Nested declarations get their parent implicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,

    /// Sink name; resolved after the whole cascade is merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GroupDecl>,
}

impl GroupDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn sink(mut self, sink: impl Into<String>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    pub fn child(mut self, child: GroupDecl) -> Self {
        self.children.push(child);
        self
    }
}
