//! Configuration documents: schema, loaders and hot reload.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → ConfigDocument (sinks + nested groups)
//!     → DocumentConfigurator / CascadingConfigurator
//!     → LoggingSystem::configure (all semantic checks happen there)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs reloads every file of the cascade
//!     → LoggingSystem::configure
//!     → failed reloads keep the active topology
//! ```
//!
//! # Design Decisions
//! - Documents are plain data; references are resolved only at finalize
//! - All fields have defaults to allow minimal documents
//! - Serde handles syntax, the topology builder handles semantics

pub mod loader;
pub mod schema;
pub mod watcher;

pub use loader::{load_document, parse_document, ConfigError, Format};
pub use schema::{ConfigDocument, GroupDecl, SinkDecl, SinkKind};
pub use watcher::ConfigWatcher;
