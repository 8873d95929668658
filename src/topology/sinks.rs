//! Sink registry and the finalized sink table.
//!
//! # Responsibilities
//! - Track sink declarations by name while documents are merged
//! - Enforce one declaration per name per layer; later layers redefine
//! - Resolve names only after the whole cascade is merged
//! - Instantiate sinks (multisinks resolve their members by name)

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::schema::SinkKind;
use crate::sink::{ConsoleSink, FileSink, MemorySink, MultiSink, NullSink, Sink};
use crate::topology::diagnostics::{ConfigurationError, Diagnostics};

/// Stable index of a sink within one topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(pub(crate) usize);

impl SinkId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What a registered name stands for.
#[derive(Debug, Clone)]
pub enum SinkSpec {
    /// Declared in a document; instantiated at finalize.
    Declared(SinkKind),
    /// Ready-made sink supplied by code.
    Instance(Arc<dyn Sink>),
}

#[derive(Debug)]
struct SinkEntry {
    name: String,
    spec: SinkSpec,
    layer: usize,
}

/// Named sink declarations accumulated across layers.
#[derive(Debug, Default)]
pub struct SinkRegistry {
    entries: Vec<SinkEntry>,
    index: HashMap<String, SinkId>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` for `layer`.
    ///
    /// A name registered earlier in the same layer is a duplicate. A name from
    /// an earlier layer is redefined in place, keeping its id.
    pub fn register(
        &mut self,
        name: &str,
        spec: SinkSpec,
        layer: usize,
    ) -> Result<SinkId, ConfigurationError> {
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName("sink"));
        }
        if let Some(&id) = self.index.get(name) {
            let entry = &mut self.entries[id.0];
            if entry.layer == layer {
                return Err(ConfigurationError::DuplicateSink(name.to_string()));
            }
            tracing::debug!(sink = %name, "sink redefined by a later configuration layer");
            entry.spec = spec;
            entry.layer = layer;
            return Ok(id);
        }

        let id = SinkId(self.entries.len());
        self.entries.push(SinkEntry {
            name: name.to_string(),
            spec,
            layer,
        });
        self.index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Look up a sink name on behalf of `referenced_by`.
    pub fn resolve(&self, name: &str, referenced_by: &str) -> Result<SinkId, ConfigurationError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownSink {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Names used as multisink members.
    pub(crate) fn member_references(&self) -> HashSet<&str> {
        self.entries
            .iter()
            .filter_map(|e| match &e.spec {
                SinkSpec::Declared(SinkKind::Multisink { sinks }) => Some(sinks),
                _ => None,
            })
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Instantiate every sink. Returns `None` if any failed; the failures are
    /// pushed to `diagnostics`.
    pub(crate) fn build(&self, diagnostics: &mut Diagnostics) -> Option<SinkTable> {
        let mut state = BuildState {
            built: vec![None; self.entries.len()],
            visiting: vec![false; self.entries.len()],
            failed: vec![false; self.entries.len()],
        };
        for id in 0..self.entries.len() {
            self.instantiate(SinkId(id), &mut state, diagnostics);
        }

        let mut entries = Vec::with_capacity(self.entries.len());
        for (entry, sink) in self.entries.iter().zip(state.built) {
            entries.push((entry.name.clone(), sink?));
        }
        Some(SinkTable::new(entries))
    }

    fn instantiate(
        &self,
        id: SinkId,
        state: &mut BuildState,
        diagnostics: &mut Diagnostics,
    ) -> Option<Arc<dyn Sink>> {
        if let Some(sink) = &state.built[id.0] {
            return Some(sink.clone());
        }
        if state.failed[id.0] {
            return None;
        }
        let entry = &self.entries[id.0];
        if state.visiting[id.0] {
            diagnostics.error(ConfigurationError::SinkCycle(entry.name.clone()));
            state.failed[id.0] = true;
            return None;
        }

        state.visiting[id.0] = true;
        let sink = self.create(entry, state, diagnostics);
        state.visiting[id.0] = false;

        match &sink {
            Some(sink) => state.built[id.0] = Some(sink.clone()),
            None => state.failed[id.0] = true,
        }
        sink
    }

    fn create(
        &self,
        entry: &SinkEntry,
        state: &mut BuildState,
        diagnostics: &mut Diagnostics,
    ) -> Option<Arc<dyn Sink>> {
        let kind = match &entry.spec {
            SinkSpec::Instance(sink) => return Some(sink.clone()),
            SinkSpec::Declared(kind) => kind,
        };

        match kind {
            SinkKind::Console { color, stream } => Some(Arc::new(ConsoleSink::new(*color, *stream))),
            SinkKind::File { path } => match FileSink::open(path) {
                Ok(sink) => Some(Arc::new(sink)),
                Err(e) => {
                    diagnostics.error(ConfigurationError::SinkBuild {
                        name: entry.name.clone(),
                        reason: format!("cannot open {}: {}", path.display(), e),
                    });
                    None
                }
            },
            SinkKind::Memory { capacity } => Some(Arc::new(MemorySink::new(*capacity))),
            SinkKind::Null => Some(Arc::new(NullSink)),
            SinkKind::Multisink { sinks } => {
                let referenced_by = format!("multisink '{}'", entry.name);
                let mut members = Vec::with_capacity(sinks.len());
                let mut complete = true;
                for member in sinks {
                    let member_id = match self.resolve(member, &referenced_by) {
                        Ok(id) => id,
                        Err(e) => {
                            diagnostics.error(e);
                            complete = false;
                            continue;
                        }
                    };
                    match self.instantiate(member_id, state, diagnostics) {
                        Some(sink) => members.push((member.clone(), sink)),
                        None => complete = false,
                    }
                }
                complete.then(|| Arc::new(MultiSink::new(members)) as Arc<dyn Sink>)
            }
        }
    }
}

struct BuildState {
    built: Vec<Option<Arc<dyn Sink>>>,
    visiting: Vec<bool>,
    failed: Vec<bool>,
}

/// Instantiated sinks of a finalized topology, indexed by [`SinkId`].
#[derive(Debug, Clone, Default)]
pub struct SinkTable {
    entries: Vec<(String, Arc<dyn Sink>)>,
    index: HashMap<String, SinkId>,
}

impl SinkTable {
    pub(crate) fn new(entries: Vec<(String, Arc<dyn Sink>)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), SinkId(i)))
            .collect();
        Self { entries, index }
    }

    pub fn find(&self, name: &str) -> Option<SinkId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: SinkId) -> &Arc<dyn Sink> {
        &self.entries[id.0].1
    }

    pub fn name(&self, id: SinkId) -> &str {
        &self.entries[id.0].0
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<dyn Sink>> {
        self.find(name).map(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SinkId, &str, &Arc<dyn Sink>)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, (name, sink))| (SinkId(i), name.as_str(), sink))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ConsoleStream;

    fn console() -> SinkSpec {
        SinkSpec::Declared(SinkKind::Console {
            color: false,
            stream: ConsoleStream::Stdout,
        })
    }

    fn multisink(members: &[&str]) -> SinkSpec {
        SinkSpec::Declared(SinkKind::Multisink {
            sinks: members.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_duplicate_in_same_layer_fails() {
        let mut registry = SinkRegistry::new();
        registry.register("console", console(), 1).unwrap();
        assert_eq!(
            registry.register("console", console(), 1),
            Err(ConfigurationError::DuplicateSink("console".into()))
        );
    }

    #[test]
    fn test_later_layer_redefines_in_place() {
        let mut registry = SinkRegistry::new();
        let first = registry.register("out", console(), 1).unwrap();
        registry.register("other", console(), 1).unwrap();
        let second = registry
            .register("out", SinkSpec::Declared(SinkKind::Memory { capacity: 4 }), 2)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 2);

        let mut diagnostics = Diagnostics::new();
        let table = registry.build(&mut diagnostics).unwrap();
        assert_eq!(table.get(first).kind(), "memory");
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = SinkRegistry::new();
        let err = registry.resolve("missing", "group 'main'").unwrap_err();
        assert_eq!(err.to_string(), "group 'main' references unknown sink 'missing'");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = SinkRegistry::new();
        assert_eq!(
            registry.register("", console(), 1),
            Err(ConfigurationError::EmptyName("sink"))
        );
    }

    #[test]
    fn test_multisink_forward_reference_builds() {
        let mut registry = SinkRegistry::new();
        registry.register("both", multisink(&["a", "b"]), 1).unwrap();
        registry.register("a", console(), 1).unwrap();
        registry.register("b", SinkSpec::Declared(SinkKind::Null), 1).unwrap();

        let mut diagnostics = Diagnostics::new();
        let table = registry.build(&mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        let both = table.by_name("both").unwrap();
        let multi = both.as_any().downcast_ref::<MultiSink>().unwrap();
        assert_eq!(multi.member_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_multisink_cycle_reported_once() {
        let mut registry = SinkRegistry::new();
        registry.register("a", multisink(&["b"]), 1).unwrap();
        registry.register("b", multisink(&["a"]), 1).unwrap();

        let mut diagnostics = Diagnostics::new();
        assert!(registry.build(&mut diagnostics).is_none());
        assert_eq!(diagnostics.error_count(), 1);
        assert!(matches!(
            diagnostics.errors().next(),
            Some(ConfigurationError::SinkCycle(_))
        ));
    }

    #[test]
    fn test_multisink_unknown_member() {
        let mut registry = SinkRegistry::new();
        registry.register("fan", multisink(&["ghost"]), 1).unwrap();

        let mut diagnostics = Diagnostics::new();
        assert!(registry.build(&mut diagnostics).is_none());
        assert_eq!(
            diagnostics.errors().next(),
            Some(&ConfigurationError::UnknownSink {
                name: "ghost".into(),
                referenced_by: "multisink 'fan'".into(),
            })
        );
    }

    #[test]
    fn test_instance_passthrough() {
        let memory: Arc<dyn Sink> = Arc::new(MemorySink::new(8));
        let mut registry = SinkRegistry::new();
        registry
            .register("mem", SinkSpec::Instance(memory.clone()), 1)
            .unwrap();

        let mut diagnostics = Diagnostics::new();
        let table = registry.build(&mut diagnostics).unwrap();
        assert!(Arc::ptr_eq(table.by_name("mem").unwrap(), &memory));
    }
}
