//! Topology subsystem.
//!
//! # Data Flow
//! ```text
//! Configurator(s)
//!     → builder.rs (merge layers: sinks, then groups depth-first)
//!     → finalize:
//!         - sinks.rs (resolve names, instantiate sinks)
//!         - groups.rs (link parents, detect cycles, check root)
//!         - resolve effective level/sink of every group once
//!     → Topology (immutable snapshot)
//!     → LoggingSystem swaps it in atomically
//! ```
//!
//! # Design Decisions
//! - All by-name references are resolved after the whole cascade is merged
//! - A topology is never mutated in place; runtime changes build a new one
//! - Effective values are cached per group, never computed per log call

pub mod builder;
pub mod diagnostics;
pub mod groups;
pub mod sinks;

use serde::Serialize;
use std::sync::Arc;

use crate::level::Level;
use crate::sink::Sink;

pub use builder::TopologyBuilder;
pub use diagnostics::{ConfigurationError, Diagnostic, Diagnostics};
pub use groups::{Group, GroupId, GroupTree, ROOT_ALIAS};
pub use sinks::{SinkId, SinkRegistry, SinkSpec, SinkTable};

/// Effective level and sink of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub level: Level,
    pub sink: SinkId,
}

/// A validated sink/group topology with resolved inheritance.
#[derive(Debug, Clone)]
pub struct Topology {
    groups: GroupTree,
    sinks: SinkTable,
    resolved: Vec<Resolved>,
}

impl Topology {
    /// Validate `groups` and cache every group's effective values.
    pub(crate) fn resolve(groups: GroupTree, sinks: SinkTable) -> Result<Self, Vec<ConfigurationError>> {
        let errors = groups.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut resolved = Vec::with_capacity(groups.len());
        let mut errors = Vec::new();
        for (id, _) in groups.iter() {
            match (groups.resolve_level(id), groups.resolve_sink(id)) {
                (Ok(level), Ok(sink)) => resolved.push(Resolved { level, sink }),
                (level, sink) => {
                    errors.extend(level.err());
                    errors.extend(sink.err());
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            groups,
            sinks,
            resolved,
        })
    }

    /// Same sinks, different group tree.
    pub(crate) fn with_groups(&self, groups: GroupTree) -> Result<Self, Vec<ConfigurationError>> {
        Self::resolve(groups, self.sinks.clone())
    }

    pub fn groups(&self) -> &GroupTree {
        &self.groups
    }

    pub fn sinks(&self) -> &SinkTable {
        &self.sinks
    }

    pub fn resolved(&self, id: GroupId) -> Resolved {
        self.resolved[id.0]
    }

    pub fn root_name(&self) -> &str {
        self.groups.name(self.groups.root())
    }

    /// Effective level of a group by name.
    pub fn effective_level(&self, group: &str) -> Option<Level> {
        self.groups.find(group).map(|id| self.resolved(id).level)
    }

    /// Effective sink name of a group by name.
    pub fn effective_sink(&self, group: &str) -> Option<&str> {
        self.groups
            .find(group)
            .map(|id| self.sinks.name(self.resolved(id).sink))
    }

    pub fn sink(&self, name: &str) -> Option<&Arc<dyn Sink>> {
        self.sinks.by_name(name)
    }

    /// Serializable summary, groups in depth-first order from the root.
    pub fn report(&self) -> TopologyReport {
        let mut groups = Vec::with_capacity(self.groups.len());
        let mut stack = vec![(self.groups.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let group = self.groups.get(id);
            let resolved = self.resolved(id);
            groups.push(GroupReport {
                name: group.name().to_string(),
                parent: group.parent().map(|p| self.groups.name(p).to_string()),
                depth,
                level: group.level(),
                sink: group.sink().map(|s| self.sinks.name(s).to_string()),
                effective_level: resolved.level,
                effective_sink: self.sinks.name(resolved.sink).to_string(),
            });
            for child in group.children().iter().rev() {
                stack.push((*child, depth + 1));
            }
        }

        TopologyReport {
            root: self.root_name().to_string(),
            sinks: self
                .sinks
                .iter()
                .map(|(_, name, sink)| SinkReport {
                    name: name.to_string(),
                    kind: sink.kind().to_string(),
                })
                .collect(),
            groups,
        }
    }
}

/// Serializable view of a topology, used by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyReport {
    pub root: String,
    pub sinks: Vec<SinkReport>,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SinkReport {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub parent: Option<String>,
    pub depth: usize,
    /// Explicit level, if declared.
    pub level: Option<Level>,
    /// Explicit sink, if declared.
    pub sink: Option<String>,
    pub effective_level: Level,
    pub effective_sink: String,
}
