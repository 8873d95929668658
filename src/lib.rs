//! Hierarchical, group-based logging.
//!
//! Loggers are bound to groups; groups form a tree under one root and
//! inherit level and sink from their nearest ancestor that sets them.
//! Topologies are built from one or more configuration documents by
//! configurators, validated as a whole and activated atomically.

#[macro_use]
mod macros;

pub mod config;
pub mod configurator;
pub mod level;
pub mod observability;
pub mod sink;
pub mod system;
pub mod topology;

pub use config::schema::ConfigDocument;
pub use configurator::{CascadingConfigurator, Configurator, DocumentConfigurator, FallbackConfigurator};
pub use level::Level;
pub use sink::{Record, Sink, SinkError};
pub use system::{ConfigureResult, DeliveryStats, LogError, Logger, LoggingSystem};
pub use topology::{ConfigurationError, Diagnostic, Diagnostics, Topology, TopologyBuilder};
