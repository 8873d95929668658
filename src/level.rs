//! Severity levels.
//!
//! # Design Decisions
//! - Declaration order is verbosity order: `Off` is the quietest, `Trace` the
//!   loudest, so `Ord` doubles as the filtering rule
//! - Labels are fixed and total; there is no "unknown" level at runtime
//! - Config text is parsed case-insensitively

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity of a log record, ordered from least to most verbose.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// No log.
    Off = 0,
    Critical,
    Error,
    Warn,
    Info,
    Verbose,
    Debug,
    Trace,
}

impl Level {
    /// Every level, quietest first.
    pub const ALL: [Level; 8] = [
        Level::Off,
        Level::Critical,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Verbose,
        Level::Debug,
        Level::Trace,
    ];

    /// Human readable label used when rendering records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Off => "?Off",
            Level::Critical => "Critical",
            Level::Error => "Error",
            Level::Warn => "Warning",
            Level::Info => "Info",
            Level::Verbose => "Verbose",
            Level::Debug => "Debug",
            Level::Trace => "Trace",
        }
    }

    /// Single character tag (first letter of the label).
    pub fn to_char(&self) -> char {
        match self {
            Level::Off => '?',
            Level::Critical => 'C',
            Level::Error => 'E',
            Level::Warn => 'W',
            Level::Info => 'I',
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Trace => 'T',
        }
    }

    /// Name accepted by configuration documents.
    pub fn config_name(&self) -> &'static str {
        match self {
            Level::Off => "off",
            Level::Critical => "critical",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Verbose => "verbose",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    /// Returns true if a record at `requested` passes a filter set to `self`.
    ///
    /// `Off` never matches an emitted record, whichever side it is on.
    #[inline]
    pub fn is_enabled_for(&self, requested: Level) -> bool {
        requested != Level::Off && requested <= *self
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when configuration text names no known level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Level::Off),
            "critical" | "crit" => Ok(Level::Critical),
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "verbose" => Ok(Level::Verbose),
            "debug" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.config_name())
    }
}
