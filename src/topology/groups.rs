//! Group tree.
//!
//! # Responsibilities
//! - Store groups in an arena indexed by [`GroupId`]
//! - Navigate parent/children links
//! - Resolve effective level and sink by walking toward the root
//! - Detect parent cycles instead of looping on them
//!
//! # Design Decisions
//! - Parents are indices, children ordered index lists; the arena owns nodes
//! - `*` addresses the root whatever its declared name

use std::collections::HashMap;

use crate::level::Level;
use crate::topology::diagnostics::ConfigurationError;
use crate::topology::sinks::SinkId;

/// Name that always addresses the root group.
pub const ROOT_ALIAS: &str = "*";

/// Stable index of a group within one topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One node of the group tree.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    pub(crate) parent: Option<GroupId>,
    children: Vec<GroupId>,
    level: Option<Level>,
    pub(crate) sink: Option<SinkId>,
}

impl Group {
    pub(crate) fn new(name: String, level: Option<Level>) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            level,
            sink: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn children(&self) -> &[GroupId] {
        &self.children
    }

    /// Explicitly declared level, if any.
    pub fn level(&self) -> Option<Level> {
        self.level
    }

    /// Explicitly declared sink, if any.
    pub fn sink(&self) -> Option<SinkId> {
        self.sink
    }
}

/// Arena of groups with exactly one root.
#[derive(Debug, Clone)]
pub struct GroupTree {
    nodes: Vec<Group>,
    index: HashMap<String, GroupId>,
    root: GroupId,
}

impl GroupTree {
    /// Build a tree from nodes whose `parent` fields are already set.
    /// Children lists are derived in node order.
    pub(crate) fn from_nodes(mut nodes: Vec<Group>, root: GroupId) -> Self {
        for node in nodes.iter_mut() {
            node.children.clear();
        }
        for i in 0..nodes.len() {
            if let Some(parent) = nodes[i].parent {
                nodes[parent.0].children.push(GroupId(i));
            }
        }
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name.clone(), GroupId(i)))
            .collect();
        Self { nodes, index, root }
    }

    pub fn root(&self) -> GroupId {
        self.root
    }

    /// Find a group by name; `*` finds the root unless a group is literally named so.
    pub fn find(&self, name: &str) -> Option<GroupId> {
        match self.index.get(name) {
            Some(id) => Some(*id),
            None if name == ROOT_ALIAS => Some(self.root),
            None => None,
        }
    }

    pub fn get(&self, id: GroupId) -> &Group {
        &self.nodes[id.0]
    }

    pub fn name(&self, id: GroupId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: GroupId) -> Option<GroupId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: GroupId) -> &[GroupId] {
        &self.nodes[id.0].children
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.nodes.iter().enumerate().map(|(i, g)| (GroupId(i), g))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `ancestor` is `id` or lies on its path to the root.
    pub fn is_ancestor_or_self(&self, ancestor: GroupId, id: GroupId) -> bool {
        let mut current = Some(id);
        for _ in 0..=self.nodes.len() {
            match current {
                Some(c) if c == ancestor => return true,
                Some(c) => current = self.nodes[c.0].parent,
                None => return false,
            }
        }
        false
    }

    /// First explicit level on the path from `id` to the root.
    pub fn resolve_level(&self, id: GroupId) -> Result<Level, ConfigurationError> {
        self.resolve_with(id, |g| g.level, ConfigurationError::RootWithoutLevel)
    }

    /// First explicit sink on the path from `id` to the root.
    pub fn resolve_sink(&self, id: GroupId) -> Result<SinkId, ConfigurationError> {
        self.resolve_with(id, |g| g.sink, ConfigurationError::RootWithoutSink)
    }

    fn resolve_with<T>(
        &self,
        id: GroupId,
        pick: impl Fn(&Group) -> Option<T>,
        missing: impl FnOnce(String) -> ConfigurationError,
    ) -> Result<T, ConfigurationError> {
        let mut current = id;
        // A path longer than the arena means a cycle.
        for _ in 0..=self.nodes.len() {
            let group = &self.nodes[current.0];
            if let Some(value) = pick(group) {
                return Ok(value);
            }
            match group.parent {
                Some(parent) => current = parent,
                None => return Err(missing(group.name.clone())),
            }
        }
        Err(ConfigurationError::Cycle(self.nodes[id.0].name.clone()))
    }

    /// Every parent cycle, each listed from where the walk entered it.
    pub fn find_cycles(&self) -> Vec<Vec<GroupId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        let mut cycles = Vec::new();
        for start in 0..self.nodes.len() {
            let mut path = Vec::new();
            let mut current = Some(GroupId(start));
            while let Some(id) = current {
                match marks[id.0] {
                    Mark::Done => break,
                    Mark::Active => {
                        if let Some(pos) = path.iter().position(|p| *p == id) {
                            cycles.push(path[pos..].to_vec());
                        }
                        break;
                    }
                    Mark::New => {
                        marks[id.0] = Mark::Active;
                        path.push(id);
                        current = self.nodes[id.0].parent;
                    }
                }
            }
            for id in path {
                marks[id.0] = Mark::Done;
            }
        }
        cycles
    }

    /// Check structural validity: no cycles, root carries level and sink.
    pub fn validate(&self) -> Vec<ConfigurationError> {
        let mut errors: Vec<ConfigurationError> = self
            .find_cycles()
            .into_iter()
            .map(|cycle| {
                let mut names: Vec<&str> = cycle.iter().map(|id| self.name(*id)).collect();
                names.push(self.name(cycle[0]));
                ConfigurationError::Cycle(names.join(" -> "))
            })
            .collect();

        let root = self.get(self.root);
        if root.level.is_none() {
            errors.push(ConfigurationError::RootWithoutLevel(root.name.clone()));
        }
        if root.sink.is_none() {
            errors.push(ConfigurationError::RootWithoutSink(root.name.clone()));
        }
        errors
    }

    pub(crate) fn set_parent_unchecked(&mut self, id: GroupId, parent: Option<GroupId>) {
        self.nodes[id.0].parent = parent;
    }

    pub(crate) fn set_sink(&mut self, id: GroupId, sink: Option<SinkId>) {
        self.nodes[id.0].sink = sink;
    }

    pub(crate) fn set_level(&mut self, id: GroupId, level: Option<Level>) {
        self.nodes[id.0].level = level;
    }

    /// Move `id` under `parent`, refusing moves that would create a cycle.
    pub(crate) fn set_parent(&mut self, id: GroupId, parent: GroupId) -> Result<(), ConfigurationError> {
        if self.is_ancestor_or_self(id, parent) {
            return Err(ConfigurationError::Cycle(format!(
                "{} -> {}",
                self.name(id),
                self.name(parent)
            )));
        }
        if let Some(old) = self.nodes[id.0].parent {
            self.nodes[old.0].children.retain(|c| *c != id);
        }
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        Ok(())
    }
}
