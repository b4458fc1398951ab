//! Effective settings: command-line flags over `lx-config` defaults

use anyhow::{Context, Result};
use lx_config::ConfigLoader;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub directory: PathBuf,
    pub bundles: bool,
    pub verbose: bool,
}

impl Settings {
    /// Load configuration files and the environment from the working
    /// directory, then apply flags. Boolean flags can only switch on.
    pub fn resolve(directory: Option<PathBuf>, bundles: bool, verbose: bool) -> Result<Self> {
        let cwd = env::current_dir().context("Failed to determine the working directory")?;
        let config = ConfigLoader::new()
            .load_from_directory(&cwd)
            .context("Failed to load configuration")?;
        let explorer = config.explorer;

        Ok(Self {
            directory: directory.unwrap_or_else(|| explorer.directory().to_path_buf()),
            bundles: bundles || explorer.bundles(),
            verbose: verbose || explorer.verbose(),
        })
    }
}
