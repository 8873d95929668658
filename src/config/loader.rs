//! Configuration loading from disk or text.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::ConfigDocument;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format for {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
}

/// Document text formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Some(Format::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Format::Json),
            _ => None,
        }
    }
}

/// Parse a document from text.
pub fn parse_document(content: &str, format: Format) -> Result<ConfigDocument, ConfigError> {
    match format {
        Format::Toml => Ok(toml::from_str(content)?),
        Format::Json => Ok(serde_json::from_str(content)?),
    }
}

/// Load a document from a `.toml` or `.json` file.
pub fn load_document(path: &Path) -> Result<ConfigDocument, ConfigError> {
    let format =
        Format::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/logger.toml")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("logger.JSON")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("logger.yml")), None);
        assert_eq!(Format::from_path(Path::new("logger")), None);
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger.toml");
        fs::write(
            &path,
            "[[groups]]\nname = \"main\"\nlevel = \"info\"\n",
        )
        .unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.groups.len(), 1);
        assert_eq!(doc.groups[0].name, "main");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_document(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_document(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let err = load_document(Path::new("logger.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
