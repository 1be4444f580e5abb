//! Document formats for container and ACL definitions.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{NavigationError, NavigationResult};

/// Supported definition file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> NavigationResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(NavigationError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Human-readable format name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }

    /// Deserialize a document from text.
    pub fn parse<T: DeserializeOwned>(self, text: &str) -> NavigationResult<T> {
        let parsed = match self {
            Self::Yaml => serde_yml::from_str(text).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| NavigationError::Parse {
            format: self.name(),
            message,
        })
    }

    /// Read and deserialize a document, choosing the format by extension.
    pub fn load<T: DeserializeOwned>(path: &Path) -> NavigationResult<T> {
        let format = Self::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        format.parse(&text)
    }
}
