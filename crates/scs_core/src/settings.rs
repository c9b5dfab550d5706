//! Import settings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pit::DecodeMode;

/// Errors that can occur while reading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which sibling files to import and how strictly to decode them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Mesh file (also loaded when `import_pis` is set)
    pub import_pim: bool,

    /// Trait file: looks and variants
    pub import_pit: bool,

    /// Collision file
    pub import_pic: bool,

    /// Prefab file
    pub import_pip: bool,

    /// Skeleton file
    pub import_pis: bool,

    /// Animation files, only when `import_pis` is also set
    pub import_pia: bool,

    /// Search subdirectories of the model directory for animations
    pub include_subdirs_for_pia: bool,

    /// Require `Header`/`Global` in PIT files and check declared counts
    pub strict: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            import_pim: true,
            import_pit: true,
            import_pic: true,
            import_pip: true,
            import_pis: true,
            import_pia: true,
            include_subdirs_for_pia: false,
            strict: false,
        }
    }
}

impl ImportSettings {
    /// Read settings from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn decode_mode(&self) -> DecodeMode {
        if self.strict {
            DecodeMode::Strict
        } else {
            DecodeMode::Lenient
        }
    }

    /// The mesh is needed by both the mesh and the skeleton import.
    pub fn wants_pim(&self) -> bool {
        self.import_pim || self.import_pis
    }

    pub fn wants_pia(&self) -> bool {
        self.import_pis && self.import_pia
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = ImportSettings::from_json_str(r#"{ "import_pic": false, "strict": true }"#).unwrap();

        assert!(!settings.import_pic);
        assert!(settings.import_pit);
        assert_eq!(settings.decode_mode(), DecodeMode::Strict);
    }

    #[test]
    fn test_animation_needs_skeleton() {
        let settings = ImportSettings {
            import_pis: false,
            ..Default::default()
        };
        assert!(!settings.wants_pia());
        assert!(settings.wants_pim());

        let settings = ImportSettings {
            import_pim: false,
            import_pis: false,
            ..Default::default()
        };
        assert!(!settings.wants_pim());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            ImportSettings::from_json_str("{ strict: yes }"),
            Err(SettingsError::Json(_))
        ));
    }
}
