//! Explorer configuration
//!
//! Default values for the `lx` command line, loaded and merged in the
//! following order (later overrides earlier):
//! 1. Global config (`~/.lx/config.toml`)
//! 2. Project config (`lx.toml`, found by walking up from the working directory)
//! 3. Environment variables (`LX_DIRECTORY`, `LX_BUNDLES`, `LX_VERBOSE`)
//! 4. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use lx_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("{}", config.explorer.directory().display());
//! ```

pub mod explorer;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use explorer::{ConfigFile, ExplorerConfig};
pub use loader::{Config, ConfigLoader};
