//! Configuration for drift.
//!
//! The configuration lives in `.config/drift.styx`, looked up from a start
//! directory and then each of its parents. It only carries data: the type
//! families used to decide whether two column type spellings mean the same
//! thing.

use facet::Facet;
use std::path::{Path, PathBuf};

/// Relative path of the configuration file inside a project directory.
pub const CONFIG_PATH: &str = ".config/drift.styx";

/// Top-level drift configuration.
#[derive(Debug, Clone, Default, PartialEq, Facet)]
pub struct Config {
    /// Whether the built-in Postgres type families are used as a base.
    ///
    /// Defaults to `true` when absent.
    pub builtin_families: Option<bool>,

    /// Additional type families. A family whose canonical name matches an
    /// existing one extends it.
    #[facet(default)]
    pub type_families: Vec<TypeFamily>,
}

impl Config {
    /// Returns whether the built-in families should be included.
    pub fn use_builtin_families(&self) -> bool {
        self.builtin_families.unwrap_or(true)
    }
}

/// A set of type spellings that all mean the same column type.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct TypeFamily {
    /// Canonical name, e.g. `text`.
    pub canonical: String,

    /// Other spellings a catalog may report, e.g. `character varying`.
    #[facet(default)]
    pub spellings: Vec<String>,
}

impl TypeFamily {
    pub fn new(
        canonical: impl Into<String>,
        spellings: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            canonical: canonical.into(),
            spellings: spellings.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parse a configuration document.
pub fn from_str(content: &str) -> Result<Config, ConfigError> {
    facet_styx::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Load configuration from `.config/drift.styx`, searching up the directory tree
/// from the current directory.
pub fn load() -> Result<(Config, PathBuf), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Path) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = find_config_file(start)?;
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let config = from_str(&content)?;

    Ok((config, config_path))
}

/// Find `.config/drift.styx` by searching up the directory tree.
fn find_config_file(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_PATH);
        if config_path.is_file() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No `.config/drift.styx` found in any parent directory
    NotFound,
    /// I/O error reading the file
    Io(String),
    /// Parse error in the Styx file
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound => {
                write!(
                    f,
                    "No {} found in the start directory or any parent",
                    CONFIG_PATH
                )
            }
            ConfigError::Io(e) => write!(f, "Failed to read {}: {}", CONFIG_PATH, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse {}: {}", CONFIG_PATH, e),
        }
    }
}

impl std::error::Error for ConfigError {}
