//! Configurator subsystem.
//!
//! # Data Flow
//! ```text
//! LoggingSystem::configure(configurator)
//!     → fresh TopologyBuilder
//!     → configurator.configure(&mut builder):
//!         - document.rs (one document = one layer)
//!         - cascade.rs (each upstream in order, same builder)
//!         - fallback.rs (synthesized minimal topology)
//!     → Diagnostics (ordered warnings and errors)
//!     → builder.finalize()
//! ```
//!
//! # Design Decisions
//! - Configurators merge straight into the shared builder, so a later layer
//!   sees and overrides what earlier layers set
//! - Cascades hold trait objects and can nest
//! - Configurators never abort on the first problem

pub mod cascade;
pub mod document;
pub mod fallback;

use std::fmt;

use crate::topology::{Diagnostics, TopologyBuilder};

pub use cascade::CascadingConfigurator;
pub use document::DocumentConfigurator;
pub use fallback::FallbackConfigurator;

/// Turns a configuration source into topology declarations.
pub trait Configurator: Send + Sync + fmt::Debug {
    /// Merge this configurator's sinks and groups into `builder`.
    fn configure(&self, builder: &mut TopologyBuilder) -> Diagnostics;
}
