//! Layered configuration loading with figment.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults ([`HeraldConfig::default`])
//! 2. The first configuration file found (`herald.toml`, or `herald.yaml` /
//!    `herald.yml` with the `yaml-config` feature), or the file given with
//!    [`ConfigLoader::file`]
//! 3. `HERALD_*` environment variables, `__` separating nested keys
//! 4. Values passed to [`ConfigLoader::merge`]
//!
//! The merged result is validated before it is returned.
//!
//! | Variable | Key |
//! |----------|-----|
//! | `HERALD_CLIENT__PREFIXES='["!", "?"]'` | `client.prefixes` |
//! | `HERALD_CLIENT__INVOKE_TIMEOUT_MS=5000` | `client.invoke_timeout_ms` |
//! | `HERALD_LOGGING__LEVEL=debug` | `logging.level` |
//!
//! ```rust,ignore
//! use herald_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("deploy/herald.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::HeraldConfig;
use super::validation::validate_config;

/// Prefix of the environment variables read by the loader.
pub const ENV_PREFIX: &str = "HERALD_";

/// File names tried in each search directory, in order.
const FILE_NAMES: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "herald.toml",
    #[cfg(feature = "yaml-config")]
    "herald.yaml",
    #[cfg(feature = "yaml-config")]
    "herald.yml",
];

/// Builder for a layered [`HeraldConfig`].
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    skip_env: bool,
    overrides: Vec<HeraldConfig>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads exactly this file instead of searching. A missing file is an error.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds a directory to search. When none is given, the working
    /// directory and `<config dir>/herald` are searched.
    pub fn search_path(mut self, path: impl AsRef<Path>) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Ignores `HERALD_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Layers `config` over every other source.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.overrides.push(config);
        self
    }

    /// Extracts and validates the configuration.
    pub fn load(self) -> ConfigResult<HeraldConfig> {
        let figment = self.figment()?;
        let config: HeraldConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            prefixes = ?config.client.prefixes,
            invoke_timeout_ms = config.client.invoke_timeout_ms,
            level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// The merged figment, before extraction.
    pub fn figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(HeraldConfig::default()));

        match &self.file {
            Some(path) if !path.exists() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_file(figment, path)?;
            }
            None => match self.find_file() {
                Some(path) => {
                    info!(path = %path.display(), "Loading configuration file");
                    figment = merge_file(figment, &path)?;
                }
                None => debug!("No configuration file found, using defaults"),
            },
        }

        if !self.skip_env {
            trace!(prefix = ENV_PREFIX, "Reading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        for config in &self.overrides {
            figment = figment.merge(Serialized::defaults(config));
        }

        Ok(figment)
    }

    fn find_file(&self) -> Option<PathBuf> {
        let defaults;
        let roots = if self.search_paths.is_empty() {
            defaults = default_search_paths();
            &defaults
        } else {
            &self.search_paths
        };

        roots
            .iter()
            .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }
}

fn default_search_paths() -> Vec<PathBuf> {
    std::env::current_dir()
        .ok()
        .into_iter()
        .chain(dirs::config_dir().map(|dir| dir.join("herald")))
        .collect()
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_owned())),
    }
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<HeraldConfig> {
    ConfigLoader::new().load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    fn empty_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("herald-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::new()
            .search_path(empty_dir())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.client.prefixes, vec!["!".to_string()]);
        assert_eq!(config.client.invoke_timeout_ms, 30_000);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/herald.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let path = empty_dir().join("herald.ini");
        std::fs::write(&path, "").unwrap();

        let err = ConfigLoader::new().file(&path).without_env().load().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[test]
    fn test_overrides_win_and_are_validated() {
        let mut config = HeraldConfig::default();
        config.client.prefixes = vec!["?".into()];
        config.client.invoke_timeout_ms = 0;

        let loaded = ConfigLoader::new()
            .search_path(empty_dir())
            .without_env()
            .merge(config.clone())
            .load()
            .unwrap();
        assert_eq!(loaded.client.prefixes, vec!["?".to_string()]);
        assert_eq!(loaded.client.invoke_timeout(), None);

        config.client.prefixes.clear();
        let err = ConfigLoader::new()
            .search_path(empty_dir())
            .without_env()
            .merge(config)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file() {
        let path = empty_dir().join("explicit.toml");
        std::fs::write(
            &path,
            r#"
            [client]
            prefixes = ["py.", "!"]

            [logging]
            level = "debug"

            [logging.filters]
            herald_framework = "trace"
            "#,
        )
        .unwrap();

        let config = ConfigLoader::new().file(&path).without_env().load().unwrap();
        assert_eq!(config.client.prefixes, vec!["py.".to_string(), "!".to_string()]);
        assert_eq!(config.client.invoke_timeout_ms, 30_000);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.filters.get("herald_framework"),
            Some(&LogLevel::Trace)
        );
    }
}
