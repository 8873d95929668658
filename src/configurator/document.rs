//! Single-document configurator.

use std::path::Path;

use crate::config::loader::{load_document, parse_document, ConfigError, Format};
use crate::config::schema::ConfigDocument;
use crate::configurator::Configurator;
use crate::topology::{Diagnostics, TopologyBuilder};

/// Applies exactly one document as one merge layer.
#[derive(Debug, Clone)]
pub struct DocumentConfigurator {
    document: ConfigDocument,
    /// Where the document came from, for log output.
    source: String,
}

impl DocumentConfigurator {
    pub fn new(document: ConfigDocument) -> Self {
        Self {
            document,
            source: "<inline>".to_string(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_document(content, Format::Toml)?))
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_document(content, Format::Json)?))
    }

    /// Load a `.toml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            document: load_document(path)?,
            source: path.display().to_string(),
        })
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Configurator for DocumentConfigurator {
    fn configure(&self, builder: &mut TopologyBuilder) -> Diagnostics {
        tracing::debug!(
            source = %self.source,
            sinks = self.document.sinks.len(),
            groups = self.document.groups.len(),
            "Applying configuration document"
        );
        builder.apply_document(&self.document)
    }
}
