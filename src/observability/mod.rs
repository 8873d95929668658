//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! LoggingSystem (configure, dispatch, logger table)
//!     → tracing macros (the framework's own structured events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → tracing-subscriber installed by the application
//!     → Metrics endpoint (Prometheus scrape), optional
//! ```
//!
//! # Design Decisions
//! - The framework never installs a subscriber or recorder itself
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod metrics;
