//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{CrossbotConfig, DispatchConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &CrossbotConfig) -> ConfigResult<()> {
    validate_groups(&config.components.groups)?;
    validate_dispatch(&config.dispatch)?;
    if let Some(url) = &config.support_url {
        validate_url(url)?;
    }
    Ok(())
}

fn validate_groups(groups: &[String]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for group in groups {
        if group.trim().is_empty() {
            return Err(ConfigError::validation("Component group names cannot be empty"));
        }
        if !seen.insert(group.as_str()) {
            return Err(ConfigError::DuplicateGroup(group.clone()));
        }
    }
    Ok(())
}

fn validate_dispatch(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if let Some(prefix) = dispatch.prefixes.iter().find(|p| p.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Text-command prefixes cannot be empty or whitespace: {prefix:?}"
        )));
    }

    if dispatch.collector_prefix.is_empty() {
        return Err(ConfigError::validation(
            "Collector prefix cannot be empty, it would match every key",
        ));
    }

    Ok(())
}

/// Only `http(s)` links render as buttons on every platform.
fn validate_url(url: &str) -> ConfigResult<()> {
    const VALID_SCHEMES: [&str; 2] = ["http://", "https://"];

    let Some(scheme) = VALID_SCHEMES.iter().find(|s| url.starts_with(*s)) else {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {VALID_SCHEMES:?}"),
        ));
    };
    if url.len() == scheme.len() {
        return Err(ConfigError::invalid_url(url, "URL has no host"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&CrossbotConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_prefixes() {
        let mut config = CrossbotConfig::default();
        config.dispatch.prefixes = vec!["!".into(), "?".into()];
        assert!(validate_config(&config).is_ok());

        config.dispatch.prefixes.push("  ".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_group() {
        let mut config = CrossbotConfig::default();
        config.components.groups = vec!["general".into(), "admin".into(), "general".into()];

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::DuplicateGroup(name)) if name == "general"));
    }

    #[test]
    fn test_validate_empty_collector_prefix() {
        let mut config = CrossbotConfig::default();
        config.dispatch.collector_prefix.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_support_url() {
        let mut config = CrossbotConfig::default();
        config.support_url = Some("https://discord.gg/crossbot".into());
        assert!(validate_config(&config).is_ok());

        for bad in ["discord.gg/crossbot", "ftp://example.com", "https://"] {
            config.support_url = Some(bad.into());
            assert!(
                matches!(validate_config(&config), Err(ConfigError::InvalidUrl { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
