//! Configuration for the dependency diff engine
//!
//! The reserved-key lists are data rather than code so they can be
//! extended from a config file without touching the parsers.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Default half-width of the lock-file version search window
const DEFAULT_WINDOW: usize = 15;

/// Default cap on the number of diff lines scanned per file
const DEFAULT_MAX_DIFF_LINES: usize = 5000;

const DEFAULT_DEPENDENCY_FILES: &[&str] = &[
    "composer.json",
    "composer.lock",
    "package.json",
    "package-lock.json",
];

const COMPOSER_RESERVED_KEYS: &[&str] = &[
    "name",
    "description",
    "type",
    "license",
    "minimum-stability",
    "prefer-stable",
    "autoload",
    "autoload-dev",
    "scripts",
    "config",
    "extra",
    "repositories",
];

const NODE_RESERVED_KEYS: &[&str] = &[
    "name",
    "version",
    "description",
    "main",
    "scripts",
    "repository",
    "keywords",
    "author",
    "license",
    "bugs",
    "homepage",
    "private",
    "engines",
    "browserslist",
];

const NODE_SKIPPED_VALUE_PREFIXES: &[&str] = &["http", "file:", "git"];

/// A package.json value must match this to count as a version range
const NODE_VERSION_PATTERN: &str = r"^[0-9^~>=<*]|^workspace:";

static DEFAULT_NODE_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(NODE_VERSION_PATTERN).expect("default version pattern is valid")
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lines searched on each side of a lock-file name line
    pub window: usize,
    /// Diff bodies longer than this are truncated before scanning (0 disables)
    pub max_diff_lines: usize,
    /// Manifest basenames that mark a commit as touching dependencies
    pub dependency_files: Vec<String>,
    /// composer.json / composer.lock settings
    pub composer: ComposerConfig,
    /// package.json / package-lock.json settings
    pub node: NodeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_diff_lines: DEFAULT_MAX_DIFF_LINES,
            dependency_files: to_owned_list(DEFAULT_DEPENDENCY_FILES),
            composer: ComposerConfig::default(),
            node: NodeConfig::default(),
        }
    }
}

/// Composer manifest settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Top-level composer.json keys that are metadata, never packages
    pub reserved_keys: Vec<String>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            reserved_keys: to_owned_list(COMPOSER_RESERVED_KEYS),
        }
    }
}

/// npm manifest settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Top-level package.json keys that are metadata, never packages
    pub reserved_keys: Vec<String>,
    /// Values starting with one of these are install-from-source specifiers
    pub skipped_value_prefixes: Vec<String>,
    /// Values not matching this are not version ranges (script commands,
    /// paths, free text)
    #[serde(deserialize_with = "deserialize_pattern")]
    pub version_pattern: Regex,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            reserved_keys: to_owned_list(NODE_RESERVED_KEYS),
            skipped_value_prefixes: to_owned_list(NODE_SKIPPED_VALUE_PREFIXES),
            version_pattern: DEFAULT_NODE_VERSION_PATTERN.clone(),
        }
    }
}

impl Config {
    /// Build a configuration from a JSON value, falling back to defaults
    /// when the value is missing or malformed.
    pub fn from_json(options: Option<serde_json::Value>) -> Self {
        match options {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => Self::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Default config file location (`<config dir>/commit-history/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("commit-history").join("config.toml"))
    }

    /// Load the config at `path`, or the default location if it exists,
    /// or the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Whether `filename`'s basename is one of the tracked manifests
    pub fn is_dependency_file(&self, filename: &str) -> bool {
        let name = crate::utils::basename(filename);
        self.dependency_files.iter().any(|f| f == name)
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn deserialize_pattern<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    let pattern = String::deserialize(deserializer)?;
    Regex::new(&pattern).map_err(serde::de::Error::custom)
}
