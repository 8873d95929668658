//! Configuration errors and diagnostics.
//!
//! # Design Decisions
//! - Returns all problems, not just the first
//! - Warnings never block activation; any error does

use std::fmt;
use thiserror::Error;

/// Problems that make a topology unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("sink '{0}' is declared more than once in the same document")]
    DuplicateSink(String),

    #[error("{referenced_by} references unknown sink '{name}'")]
    UnknownSink { name: String, referenced_by: String },

    #[error("group '{referenced_by}' references unknown parent group '{name}'")]
    UnknownGroup { name: String, referenced_by: String },

    #[error("no root group is declared")]
    NoRootGroup,

    #[error("root group '{0}' has no level")]
    RootWithoutLevel(String),

    #[error("root group '{0}' has no sink")]
    RootWithoutSink(String),

    #[error("root group '{root}' cannot be given parent '{parent}'")]
    RootReparented { root: String, parent: String },

    #[error("groups form a parent cycle: {0}")]
    Cycle(String),

    #[error("a {0} is declared with an empty name")]
    EmptyName(&'static str),

    #[error("multisink '{0}' reaches itself through its members")]
    SinkCycle(String),

    #[error("sink '{name}' could not be created: {reason}")]
    SinkBuild { name: String, reason: String },
}

/// One entry of a configuration report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Warning(String),
    Error(ConfigurationError),
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        matches!(self, Diagnostic::Error(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Warning(message) => write!(f, "warning: {}", message),
            Diagnostic::Error(err) => write!(f, "error: {}", err),
        }
    }
}

/// Ordered diagnostics collected while configuring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.0.push(Diagnostic::Warning(message.into()));
    }

    pub fn error(&mut self, error: ConfigurationError) {
        self.0.push(Diagnostic::Error(error));
    }

    /// Append `other`, keeping order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConfigurationError> {
        self.0.iter().filter_map(|d| match d {
            Diagnostic::Error(e) => Some(e),
            Diagnostic::Warning(_) => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|d| match d {
            Diagnostic::Warning(w) => Some(w.as_str()),
            Diagnostic::Error(_) => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
