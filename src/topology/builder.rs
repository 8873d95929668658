//! Topology under construction.
//!
//! # Responsibilities
//! - Merge configuration layers: sinks first, then groups depth-first
//! - Overlay fields of existing groups; unset fields stay untouched
//! - Defer every by-name reference (parents, sinks) to finalize
//! - Validate and produce an immutable [`Topology`]
//!
//! # Design Decisions
//! - One layer per document; sink duplicates are only errors within a layer
//! - Re-parenting in a later layer: last write wins, with a warning
//! - The first group declared without a parent becomes the root; later
//!   parentless groups that are new get attached under it

use std::collections::{HashMap, HashSet};

use crate::config::schema::{ConfigDocument, GroupDecl};
use crate::level::Level;
use crate::topology::diagnostics::{ConfigurationError, Diagnostics};
use crate::topology::groups::{Group, GroupId, GroupTree, ROOT_ALIAS};
use crate::topology::sinks::{SinkId, SinkRegistry, SinkSpec};
use crate::topology::Topology;

#[derive(Debug)]
struct PendingGroup {
    name: String,
    parent: Option<String>,
    level: Option<Level>,
    sink: Option<String>,
    layer: usize,
}

/// The shared topology configurators merge into.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    sinks: SinkRegistry,
    groups: Vec<PendingGroup>,
    index: HashMap<String, usize>,
    root: Option<usize>,
    layer: usize,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new merge layer (one document / one configurator pass).
    pub fn begin_layer(&mut self) -> usize {
        self.layer += 1;
        self.layer
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Register a sink in the current layer.
    pub fn register_sink(&mut self, name: &str, spec: SinkSpec) -> Result<SinkId, ConfigurationError> {
        self.sinks.register(name, spec, self.layer)
    }

    pub fn sinks(&self) -> &SinkRegistry {
        &self.sinks
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root.map(|r| self.groups[r].name.as_str())
    }

    /// Explicit level currently declared for `name`.
    pub fn group_level(&self, name: &str) -> Option<Level> {
        self.lookup(name).and_then(|i| self.groups[i].level)
    }

    /// Explicit sink name currently declared for `name`.
    pub fn group_sink(&self, name: &str) -> Option<&str> {
        self.lookup(name).and_then(|i| self.groups[i].sink.as_deref())
    }

    /// Parent name currently recorded for `name` (`*` means the root).
    pub fn group_parent(&self, name: &str) -> Option<&str> {
        self.lookup(name).and_then(|i| self.groups[i].parent.as_deref())
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        match self.index.get(name) {
            Some(i) => Some(*i),
            None if name == ROOT_ALIAS => self.root,
            None => None,
        }
    }

    fn same_group(&self, a: &str, b: &str) -> bool {
        a == b || matches!((self.lookup(a), self.lookup(b)), (Some(x), Some(y)) if x == y)
    }

    /// Create `name` or overlay the given fields onto it.
    pub fn upsert_group(
        &mut self,
        name: &str,
        parent: Option<&str>,
        level: Option<Level>,
        sink: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ConfigurationError> {
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName("group"));
        }

        let Some(idx) = self.lookup(name) else {
            let is_root = parent.is_none() && self.root.is_none();
            let parent = match parent {
                Some(p) => Some(p.to_string()),
                None if is_root => None,
                None => Some(ROOT_ALIAS.to_string()),
            };
            let idx = self.groups.len();
            self.groups.push(PendingGroup {
                name: name.to_string(),
                parent,
                level,
                sink: sink.map(str::to_owned),
                layer: self.layer,
            });
            self.index.insert(name.to_string(), idx);
            if is_root {
                self.root = Some(idx);
            }
            return Ok(());
        };

        if self.groups[idx].layer == self.layer {
            diagnostics.warn(format!(
                "group '{}' is declared more than once in one document; fields are merged",
                name
            ));
        }

        if let Some(parent) = parent {
            if Some(idx) == self.root {
                return Err(ConfigurationError::RootReparented {
                    root: self.groups[idx].name.clone(),
                    parent: parent.to_string(),
                });
            }
            match self.groups[idx].parent.clone() {
                Some(old) if self.same_group(&old, parent) => {}
                Some(old) => {
                    diagnostics.warn(format!(
                        "group '{}' re-parented from '{}' to '{}'",
                        name, old, parent
                    ));
                    self.groups[idx].parent = Some(parent.to_string());
                }
                None => self.groups[idx].parent = Some(parent.to_string()),
            }
        }

        let group = &mut self.groups[idx];
        if level.is_some() {
            group.level = level;
        }
        if let Some(sink) = sink {
            group.sink = Some(sink.to_string());
        }
        group.layer = self.layer;
        Ok(())
    }

    /// Merge one document as a new layer: sinks first, then groups depth-first.
    pub fn apply_document(&mut self, document: &ConfigDocument) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        self.begin_layer();

        for sink in &document.sinks {
            if let Err(e) = self.register_sink(&sink.name, SinkSpec::Declared(sink.kind.clone())) {
                diagnostics.error(e);
            }
        }
        for group in &document.groups {
            self.apply_group(group, None, &mut diagnostics);
        }
        diagnostics
    }

    fn apply_group(&mut self, decl: &GroupDecl, enclosing: Option<&str>, diagnostics: &mut Diagnostics) {
        let parent = decl.parent.as_deref().or(enclosing);
        if let Err(e) = self.upsert_group(
            &decl.name,
            parent,
            decl.level,
            decl.sink.as_deref(),
            diagnostics,
        ) {
            diagnostics.error(e);
            if !decl.children.is_empty() {
                diagnostics.warn(format!(
                    "{} child group(s) of '{}' are unreachable and were skipped",
                    decl.children.len(),
                    decl.name
                ));
            }
            return;
        }
        for child in &decl.children {
            self.apply_group(child, Some(decl.name.as_str()), diagnostics);
        }
    }

    /// Validate the merged layers and build the immutable topology.
    ///
    /// Problems are appended to `diagnostics`; `None` means at least one error.
    pub fn finalize(self, diagnostics: &mut Diagnostics) -> Option<Topology> {
        let Some(root) = self.root else {
            diagnostics.error(ConfigurationError::NoRootGroup);
            return None;
        };

        let mut nodes: Vec<Group> = self
            .groups
            .iter()
            .map(|g| Group::new(g.name.clone(), g.level))
            .collect();
        let mut referenced: HashSet<&str> = self.sinks.member_references();

        for (pending, node) in self.groups.iter().zip(nodes.iter_mut()) {
            if let Some(name) = pending.parent.as_deref() {
                match self.lookup(name) {
                    Some(p) => node.parent = Some(GroupId(p)),
                    None => diagnostics.error(ConfigurationError::UnknownGroup {
                        name: name.to_string(),
                        referenced_by: pending.name.clone(),
                    }),
                }
            }
            if let Some(sink) = pending.sink.as_deref() {
                referenced.insert(sink);
                match self.sinks.resolve(sink, &format!("group '{}'", pending.name)) {
                    Ok(id) => node.sink = Some(id),
                    Err(e) => diagnostics.error(e),
                }
            }
        }

        for name in self.sinks.names() {
            if !referenced.contains(name) {
                diagnostics.warn(format!("sink '{}' is declared but never used", name));
            }
        }

        // Instantiating sinks opens files; a rejected configuration must not.
        if diagnostics.has_errors() {
            return None;
        }
        let sinks = self.sinks.build(diagnostics);
        if diagnostics.has_errors() {
            return None;
        }

        let tree = GroupTree::from_nodes(nodes, GroupId(root));
        let sinks = sinks?;
        match Topology::resolve(tree, sinks) {
            Ok(topology) => Some(topology),
            Err(errors) => {
                for e in errors {
                    diagnostics.error(e);
                }
                None
            }
        }
    }
}
