//! Application settings loaded from config.toml
//!
//! Every field has a default, so a missing config file yields a working setup
//! with an empty catalog seed.

use crate::config::catalog::CategorySeed;
use crate::core::curation::DraftMatching;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_WHATSAPP_NUMBER: &str = "+2349122834983";
const DEFAULT_LOCAL_STORAGE_PATH: &str = "data/local_storage.json";

/// Top-level structure of config.toml
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Destination handle for order confirmation messages
    #[serde(default = "default_whatsapp_number")]
    pub whatsapp_number: String,
    /// File backing the client-side key-value store (drafts and the active session)
    #[serde(default = "default_local_storage_path")]
    pub local_storage_path: PathBuf,
    /// How saved drafts are matched on re-save
    #[serde(default)]
    pub draft_matching: DraftMatching,
    /// Catalog seed
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

fn default_whatsapp_number() -> String {
    DEFAULT_WHATSAPP_NUMBER.to_string()
}

fn default_local_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_STORAGE_PATH)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            whatsapp_number: default_whatsapp_number(),
            local_storage_path: default_local_storage_path(),
            draft_matching: DraftMatching::default(),
            categories: Vec::new(),
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse TOML from config file {path_ref:?}: {e}"),
    })
}

/// Loads settings from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error; defaults are used instead.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("CONFIG_PATH")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if !path.exists() {
        info!("No config file at {:?}, using default settings.", path);
        return Ok(Settings::default());
    }
    load_settings(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_settings_with_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.whatsapp_number, DEFAULT_WHATSAPP_NUMBER);
        assert_eq!(settings.draft_matching, DraftMatching::Id);
        assert!(settings.categories.is_empty());
    }

    #[test]
    fn test_parse_settings_overrides() {
        let toml_str = r#"
            whatsapp_number = "+2348000000000"
            local_storage_path = "/tmp/drafts.json"
            draft_matching = "name"
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.whatsapp_number, "+2348000000000");
        assert_eq!(settings.local_storage_path, PathBuf::from("/tmp/drafts.json"));
        assert_eq!(settings.draft_matching, DraftMatching::Name);
    }

    #[test]
    fn test_load_settings_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "draft_matching = \"name\"")?;
        let settings = load_settings(file.path())?;
        assert_eq!(settings.draft_matching, DraftMatching::Name);
        Ok(())
    }

    #[test]
    fn test_load_settings_reports_bad_toml() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "draft_matching = ")?;
        assert!(matches!(
            load_settings(file.path()),
            Err(Error::Config { .. })
        ));
        Ok(())
    }
}
