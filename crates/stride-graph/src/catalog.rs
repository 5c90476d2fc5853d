//! Goal catalog documents
//!
//! Templates and edges are shipped as a YAML/JSON/TOML document and turned
//! into a [`GoalGraph`](crate::GoalGraph) once at startup.

use crate::error::ConfigError;
use crate::template::{GoalGraphEdge, GoalTemplate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../catalog/default.yaml");

/// Text format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl DocumentFormat {
    /// Guess the format from a file extension
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedFormat`] for unknown extensions
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Parse `text` into `T`
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidDocument`] if the text does not parse
    pub fn parse<T: DeserializeOwned>(self, text: &str) -> Result<T, ConfigError> {
        match self {
            Self::Json => {
                serde_json::from_str(text).map_err(|e| ConfigError::InvalidDocument(e.to_string()))
            }
            Self::Yaml => {
                serde_yaml::from_str(text).map_err(|e| ConfigError::InvalidDocument(e.to_string()))
            }
            Self::Toml => {
                toml::from_str(text).map_err(|e| ConfigError::InvalidDocument(e.to_string()))
            }
        }
    }

    /// Read and parse the file at `path`, format chosen by extension
    ///
    /// # Errors
    /// I/O failures, unknown extensions and parse errors
    pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let format = Self::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        format.parse(&text)
    }
}

/// Serialized form of the template catalog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GoalCatalog {
    /// Templates in display order
    pub templates: Vec<GoalTemplate>,
    /// Parent/child edges; children keep the order listed here
    #[serde(default)]
    pub edges: Vec<GoalGraphEdge>,
}

impl GoalCatalog {
    /// Catalog bundled with the crate
    ///
    /// # Errors
    /// Only if the bundled document is malformed
    pub fn builtin() -> Result<Self, ConfigError> {
        DocumentFormat::Yaml.parse(BUILTIN_CATALOG)
    }

    /// Parse from text in the given format
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidDocument`] on parse failure
    pub fn from_str_as(text: &str, format: DocumentFormat) -> Result<Self, ConfigError> {
        format.parse(text)
    }

    /// Load from a file, format chosen by extension
    ///
    /// # Errors
    /// I/O failures, unknown extensions and parse errors
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        DocumentFormat::load(path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = GoalCatalog::builtin().unwrap();
        assert!(catalog.templates.len() > 5);
        assert!(!catalog.edges.is_empty());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/catalog.YML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert!(DocumentFormat::from_path(Path::new("catalog.ini")).is_err());
    }

    #[test]
    fn json_catalog_round_trips_through_parser() {
        let json = r#"{
            "templates": [
                {"id": "fitness", "title": "Fitness", "category": "area",
                 "lifeArea": "fitness", "horizon": "long", "defaultWeight": 1.0}
            ]
        }"#;
        let catalog = GoalCatalog::from_str_as(json, DocumentFormat::Json).unwrap();
        assert_eq!(catalog.templates[0].target_value, 100.0);
        assert!(catalog.edges.is_empty());
    }

    #[test]
    fn malformed_document_is_config_error() {
        let err = GoalCatalog::from_str_as("templates: [", DocumentFormat::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDocument(_)));
    }
}
