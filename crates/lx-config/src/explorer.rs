//! Explorer configuration files (`lx.toml`, `~/.lx/config.toml`)
//!
//! Both files share one format:
//!
//! ```toml
//! [explorer]
//! directory = "/opt/runtime"
//! bundles = true
//! verbose = false
//! ```

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_DIRECTORY: &str = ".";

/// The contents of one configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer: Option<ExplorerConfig>,
}

/// Defaults for the explorer command line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Runtime installation to inspect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Also read bundle jars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundles: Option<bool>,

    /// Debug logging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl ConfigFile {
    /// Load a configuration file.
    ///
    /// A relative `directory` is resolved against the file's own directory.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let mut config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error: e,
            })?;
        config.validate()?;

        if let (Some(base), Some(explorer)) = (path.parent(), config.explorer.as_mut()) {
            explorer.resolve_directory(base);
        }
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(explorer) = &self.explorer {
            explorer.validate()?;
        }
        Ok(())
    }

    /// The `[explorer]` table, or all defaults
    pub fn explorer(&self) -> ExplorerConfig {
        self.explorer.clone().unwrap_or_default()
    }
}

impl ExplorerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self
            .directory
            .as_ref()
            .is_some_and(|d| d.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "explorer.directory".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Merge another config into this one.
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ExplorerConfig) {
        if other.directory.is_some() {
            self.directory = other.directory.clone();
        }
        if other.bundles.is_some() {
            self.bundles = other.bundles;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
    }

    fn resolve_directory(&mut self, base: &Path) {
        if let Some(directory) = self.directory.as_mut() {
            if directory.is_relative() {
                *directory = base.join(&*directory);
            }
        }
    }

    /// Effective installation directory (default `.`)
    pub fn directory(&self) -> &Path {
        self.directory
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_DIRECTORY))
    }

    /// Effective bundle flag (default `false`)
    pub fn bundles(&self) -> bool {
        self.bundles.unwrap_or(false)
    }

    /// Effective verbosity (default `false`)
    pub fn verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }
}
