//! Configuration management for afetch
//!
//! Settings come from three layers, later layers winning:
//! built-in defaults, the TOML config file, and `AFETCH_*` environment
//! variables.

use crate::error::{CliError, Result};
use afetch_common::StructureFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Download root of the EMBL-EBI AlphaFold database.
pub const DEFAULT_BASE_URL: &str = "https://alphafold.ebi.ac.uk/files";

/// Highest model version probed by default. Versions are tried from here
/// down to 1; raise it when the database publishes a new model version.
pub const DEFAULT_MAX_VERSION: u32 = 9;

/// Default timeout for a single HTTP request in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Keys accepted by `afetch config get/set`.
pub const CONFIG_KEYS: &[&str] = &[
    "base_url",
    "max_version",
    "fetch_path",
    "default_format",
    "timeout_secs",
];

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL that `AF-{id}-F1-model_v{version}.{ext}` is appended to
    pub base_url: String,

    /// Highest model version to probe
    pub max_version: u32,

    /// Directory downloaded files are stored in
    pub fetch_path: PathBuf,

    /// Format used when a fetch does not name one
    pub default_format: StructureFormat,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_version: DEFAULT_MAX_VERSION,
            fetch_path: PathBuf::from("."),
            default_format: StructureFormat::Cif,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Location of the config file.
    ///
    /// `AFETCH_CONFIG` overrides the platform config directory.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("AFETCH_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        Ok(dirs::config_dir()
            .ok_or_else(|| CliError::config("Could not determine config directory"))?
            .join("afetch")
            .join("config.toml"))
    }

    /// Load defaults, the config file (if present) and environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a config file, falling back to defaults when it does not exist
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply `AFETCH_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in CONFIG_KEYS {
            if let Some(value) = lookup(&env_var_name(key)) {
                self.set(key, &value)?;
            }
        }
        Ok(())
    }

    /// Read a setting by key
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "base_url" => self.base_url.clone(),
            "max_version" => self.max_version.to_string(),
            "fetch_path" => self.fetch_path.display().to_string(),
            "default_format" => self.default_format.to_string(),
            "timeout_secs" => self.timeout_secs.to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Update a setting by key, validating the new value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "base_url" => {
                let url = value.trim_end_matches('/');
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(CliError::config(format!(
                        "base_url must be an http(s) URL, got '{}'",
                        value
                    )));
                }
                next.base_url = url.to_string();
            },
            "max_version" => {
                next.max_version = value
                    .parse()
                    .map_err(|_| CliError::config(format!("max_version must be an integer, got '{}'", value)))?;
            },
            "fetch_path" => {
                next.fetch_path = if value.is_empty() { PathBuf::from(".") } else { PathBuf::from(value) };
            },
            "default_format" => {
                next.default_format = StructureFormat::parse(value)?;
            },
            "timeout_secs" => {
                next.timeout_secs = value
                    .parse()
                    .map_err(|_| CliError::config(format!("timeout_secs must be an integer, got '{}'", value)))?;
            },
            _ => return Err(unknown_key(key)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.max_version == 0 {
            return Err(CliError::config("max_version must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(CliError::config("timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Format a config key as its environment variable name
pub fn env_var_name(key: &str) -> String {
    format!("AFETCH_{}", key.to_uppercase())
}

fn unknown_key(key: &str) -> CliError {
    CliError::config(format!(
        "Unknown config key '{}'. Valid keys: {}",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_version, DEFAULT_MAX_VERSION);
        assert_eq!(config.default_format, StructureFormat::Cif);
        assert_eq!(config.fetch_path, PathBuf::from("."));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<String, String> = [
            ("AFETCH_BASE_URL", "http://127.0.0.1:9000/files/"),
            ("AFETCH_MAX_VERSION", "6"),
            ("AFETCH_DEFAULT_FORMAT", "pdb"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).cloned()).unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:9000/files");
        assert_eq!(config.max_version, 6);
        assert_eq!(config.default_format, StructureFormat::Pdb);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("max_version", "0").is_err());
        assert!(config.set("max_version", "many").is_err());
        assert!(config.set("default_format", "xyz").is_err());
        assert!(config.set("base_url", "ftp://example.org").is_err());
        assert!(config.set("colour", "red").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_get_every_key() {
        let config = Config::default();
        for key in CONFIG_KEYS {
            assert!(config.get(key).is_ok(), "key {} not readable", key);
        }
        assert_eq!(config.get("default_format").unwrap(), "cif");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("max_version", "5").unwrap();
        config.set("default_format", "pdb2").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_version = 7\n").unwrap();

        let loaded = Config::load_file(&path).unwrap();
        assert_eq!(loaded.max_version, 7);
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("max_version"), "AFETCH_MAX_VERSION");
    }
}
