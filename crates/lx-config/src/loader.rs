//! Configuration loader
//!
//! Loads configuration from multiple sources and merges them with proper precedence.

use crate::explorer::{ConfigFile, ExplorerConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const PROJECT_FILE: &str = "lx.toml";

pub const ENV_DIRECTORY: &str = "LX_DIRECTORY";
pub const ENV_BUNDLES: &str = "LX_BUNDLES";
pub const ENV_VERBOSE: &str = "LX_VERBOSE";

/// Configuration loader
///
/// Sources in increasing precedence:
/// 1. Global config (`~/.lx/config.toml`)
/// 2. Project config (`lx.toml`)
/// 3. Environment variables (`LX_*`)
/// 4. CLI flags (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Effective explorer settings
    pub explorer: ExplorerConfig,

    /// Project config file that contributed, if any
    pub project_file: Option<PathBuf>,

    /// Global config file that contributed, if any
    pub global_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use `path` instead of `~/.lx/config.toml` as the global config
    pub fn with_global_config(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory.
    ///
    /// Walks up the directory tree to find `lx.toml`. Missing files fall
    /// back to defaults; malformed files are errors.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let mut config = Config::default();
        self.merge_global_config(&mut config)?;

        if let Some(path) = find_project_file(start_dir) {
            config
                .explorer
                .merge(&ConfigFile::load_from_file(&path)?.explorer());
            config.project_file = Some(path);
        }

        config.explorer.merge(&env_overrides()?);
        Ok(config)
    }

    /// Load configuration from one specific project file, still honouring
    /// the global config and environment overrides
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let mut config = Config::default();
        self.merge_global_config(&mut config)?;

        config
            .explorer
            .merge(&ConfigFile::load_from_file(config_path)?.explorer());
        config.project_file = Some(config_path.to_path_buf());

        config.explorer.merge(&env_overrides()?);
        Ok(config)
    }

    /// Global config is optional; when it exists it must be valid
    fn merge_global_config(&mut self, config: &mut Config) -> ConfigResult<()> {
        if let Some(path) = self.global_config_path() {
            if path.is_file() {
                config
                    .explorer
                    .merge(&ConfigFile::load_from_file(&path)?.explorer());
                config.global_file = Some(path);
            }
        }
        Ok(())
    }

    fn global_config_path(&mut self) -> Option<PathBuf> {
        if self.global_config_path.is_none() {
            self.global_config_path = Self::global_config_dir().map(|d| d.join("config.toml"));
        }
        self.global_config_path.clone()
    }

    /// The global configuration directory (`~/.lx`)
    pub fn global_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".lx"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest `lx.toml` in `start_dir` or one of its ancestors
fn find_project_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|path| path.is_file())
}

/// Settings taken from `LX_*` environment variables
fn env_overrides() -> ConfigResult<ExplorerConfig> {
    let mut config = ExplorerConfig::default();

    if let Ok(directory) = env::var(ENV_DIRECTORY) {
        if directory.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: ENV_DIRECTORY.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        config.directory = Some(PathBuf::from(directory));
    }
    if let Ok(bundles) = env::var(ENV_BUNDLES) {
        config.bundles = Some(is_truthy(&bundles));
    }
    if let Ok(verbose) = env::var(ENV_VERBOSE) {
        config.verbose = Some(is_truthy(&verbose));
    }

    Ok(config)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    /// Whether an `lx.toml` contributed to this configuration
    pub fn is_project(&self) -> bool {
        self.project_file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn loader(home: &TempDir) -> ConfigLoader {
        ConfigLoader::with_global_config(home.path().join("config.toml"))
    }

    #[rstest]
    #[case("true", true)]
    #[case("YES", true)]
    #[case("1", true)]
    #[case("false", false)]
    #[case("0", false)]
    #[case("on", false)]
    fn test_is_truthy(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_truthy(value), expected);
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            project.path().join(PROJECT_FILE),
            "[explorer]\nbundles = true\n",
        )
        .unwrap();
        let sub_dir = project.path().join("a/b");
        fs::create_dir_all(&sub_dir).unwrap();

        let config = loader(&home).load_from_directory(&sub_dir).unwrap();

        assert!(config.explorer.bundles());
        assert_eq!(
            config.project_file.as_deref(),
            Some(project.path().join(PROJECT_FILE).as_path())
        );
    }

    #[test]
    #[serial]
    fn test_no_config_anywhere() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let config = loader(&home).load_from_directory(project.path()).unwrap();

        assert!(!config.is_project());
        assert!(config.global_file.is_none());
        assert_eq!(config.explorer.directory(), Path::new("."));
    }

    #[test]
    #[serial]
    fn test_env_overrides_project() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            project.path().join(PROJECT_FILE),
            "[explorer]\ndirectory = \"/from/file\"\nverbose = false\n",
        )
        .unwrap();

        env::set_var(ENV_DIRECTORY, "/from/env");
        env::set_var(ENV_VERBOSE, "1");

        let config = loader(&home).load_from_directory(project.path());

        env::remove_var(ENV_DIRECTORY);
        env::remove_var(ENV_VERBOSE);

        let config = config.unwrap();
        assert_eq!(config.explorer.directory(), Path::new("/from/env"));
        assert!(config.explorer.verbose());
    }

    #[test]
    #[serial]
    fn test_empty_env_directory_rejected() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        env::set_var(ENV_DIRECTORY, "");
        let result = loader(&home).load_from_directory(project.path());
        env::remove_var(ENV_DIRECTORY);

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
