//! Cascading configurator: base profile plus overlays.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::loader::ConfigError;
use crate::configurator::{Configurator, DocumentConfigurator};
use crate::topology::{Diagnostics, TopologyBuilder};

/// Runs upstream configurators in order against the same builder.
///
/// Later layers override fields set by earlier ones; diagnostics are
/// concatenated in invocation order.
#[derive(Debug, Clone, Default)]
pub struct CascadingConfigurator {
    layers: Vec<Arc<dyn Configurator>>,
}

impl CascadingConfigurator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer that overrides everything before it.
    pub fn then(mut self, layer: impl Configurator + 'static) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    /// Append an already shared layer.
    pub fn then_shared(mut self, layer: Arc<dyn Configurator>) -> Self {
        self.layers.push(layer);
        self
    }

    /// One document layer per file, in the given order.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        paths.iter().try_fold(Self::new(), |cascade, path| {
            Ok(cascade.then(DocumentConfigurator::from_path(path)?))
        })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Configurator for CascadingConfigurator {
    fn configure(&self, builder: &mut TopologyBuilder) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        for layer in &self.layers {
            diagnostics.extend(layer.configure(builder));
        }
        diagnostics
    }
}
