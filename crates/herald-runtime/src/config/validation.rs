//! Configuration validation.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ClientConfig, HeraldConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_client(&config.client)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_client(client: &ClientConfig) -> ConfigResult<()> {
    if client.prefixes.is_empty() {
        return Err(ConfigError::validation(
            "client.prefixes must contain at least one prefix",
        ));
    }

    let mut seen = HashSet::new();
    for prefix in &client.prefixes {
        if prefix.is_empty() {
            return Err(ConfigError::validation("client.prefixes contains an empty prefix"));
        }
        if !seen.insert(prefix) {
            return Err(ConfigError::validation(format!(
                "client.prefixes lists '{prefix}' twice"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        let Some(path) = &logging.file_path else {
            return Err(ConfigError::validation(
                "logging.file_path is required when logging.output = \"file\"",
            ));
        };
        if path.file_name().is_none() {
            return Err(ConfigError::validation(format!(
                "logging.file_path '{}' does not name a file",
                path.display()
            )));
        }
    }

    if let Some(target) = logging.filters.keys().find(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "logging.filters has an empty target: {target:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&HeraldConfig::default()).is_ok());
    }

    #[test]
    fn test_prefixes() {
        let mut config = HeraldConfig::default();
        config.client.prefixes.clear();
        assert!(validate_config(&config).is_err());

        config.client.prefixes = vec!["!".into(), String::new()];
        assert!(validate_config(&config).is_err());

        config.client.prefixes = vec!["!".into(), "!".into()];
        assert!(validate_config(&config).is_err());

        config.client.prefixes = vec!["!".into(), "?".into()];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = HeraldConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("logs/herald.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_filter_target() {
        let mut config = HeraldConfig::default();
        config.logging.filters.insert(" ".into(), LogLevel::Debug);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation { .. })
        ));
    }
}
