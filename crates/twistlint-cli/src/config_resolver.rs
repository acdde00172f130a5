//! Configuration file discovery.
//!
//! Priority order:
//!
//! 1. `--config` flag (or `TWISTLINT_CONFIG`)
//! 2. `twistlint.toml` or `.twistlint.toml` in the checked directory or
//!    the nearest ancestor that has one
//! 3. `~/.twistlint/config.toml` (`TWISTLINT_CONFIG_DIR` replaces the
//!    directory)
//! 4. Built-in defaults

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use twistlint_core::Config;

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line.
    Explicit(PathBuf),
    /// Found next to the checked sources.
    Project(PathBuf),
    /// Found in the user's config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Path of the config file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Reads and parses the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(&self) -> Result<Config> {
        let Some(path) = self.path() else {
            tracing::debug!("No config file found, using defaults");
            return Ok(Config::default());
        };
        if matches!(self, Self::Global(_)) {
            tracing::info!("Using global config: {}", path.display());
        } else {
            tracing::debug!("Using config: {}", path.display());
        }
        Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

const PROJECT_CONFIG_NAMES: &[&str] = &["twistlint.toml", ".twistlint.toml"];

const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Finds the configuration for sources under `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(project_dir, explicit, global_config_dir())
}

fn resolve_inner(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    let start = project_dir
        .canonicalize()
        .unwrap_or_else(|_| project_dir.to_path_buf());
    for dir in start.ancestors() {
        if let Some(found) = PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
        {
            return ConfigSource::Project(found);
        }
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|candidate| candidate.is_file())
        .map_or(ConfigSource::Default, ConfigSource::Global)
}

/// The user's config directory: `$TWISTLINT_CONFIG_DIR` or `~/.twistlint/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("TWISTLINT_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".twistlint"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn canonical(dir: &TempDir) -> PathBuf {
        dir.path().canonicalize().unwrap()
    }

    #[test]
    fn explicit_wins_without_existence_check() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("twistlint.toml"), "").unwrap();

        let result = resolve_inner(project.path(), Some(Path::new("/nonexistent.toml")), None);
        assert_eq!(
            result,
            ConfigSource::Explicit(PathBuf::from("/nonexistent.toml"))
        );
    }

    #[test]
    fn plain_name_preferred_over_dot_name() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join(".twistlint.toml"), "").unwrap();
        assert_eq!(
            resolve_inner(project.path(), None, None),
            ConfigSource::Project(canonical(&project).join(".twistlint.toml"))
        );

        fs::write(project.path().join("twistlint.toml"), "").unwrap();
        assert_eq!(
            resolve_inner(project.path(), None, None),
            ConfigSource::Project(canonical(&project).join("twistlint.toml"))
        );
    }

    #[test]
    fn ancestor_config_is_found() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("twistlint.toml"), "").unwrap();
        let nested = project.path().join("twisted/web");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            resolve_inner(&nested, None, None),
            ConfigSource::Project(canonical(&project).join("twistlint.toml"))
        );
    }

    #[test]
    fn global_is_the_fallback() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        assert_eq!(
            resolve_inner(project.path(), None, Some(global.path().to_path_buf())),
            ConfigSource::Default
        );

        fs::write(global.path().join("config.toml"), "").unwrap();
        assert_eq!(
            resolve_inner(project.path(), None, Some(global.path().to_path_buf())),
            ConfigSource::Global(global.path().join("config.toml"))
        );
    }

    #[test]
    fn load_parses_or_defaults() {
        assert!(ConfigSource::Default.load().unwrap().preset.is_none());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("twistlint.toml");
        fs::write(&path, "preset = \"pep8\"\n").unwrap();
        let config = ConfigSource::Project(path.clone()).load().unwrap();
        assert_eq!(config.preset.as_deref(), Some("pep8"));

        fs::write(&path, "preset = [").unwrap();
        assert!(ConfigSource::Project(path).load().is_err());
    }
}
