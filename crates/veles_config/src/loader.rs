//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ToolConfig;
use std::path::{Path, PathBuf};

/// The installation root, from `VELES_HOME`; falls back to the current
/// directory. The NPN4 database cache and documentation live under it.
pub fn home_dir() -> PathBuf {
    std::env::var_os("VELES_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Loads `veles.toml` from a directory; a missing file yields defaults.
pub fn load_config(dir: &Path) -> Result<ToolConfig, ConfigError> {
    let path = dir.join("veles.toml");
    if !path.exists() {
        return Ok(ToolConfig::default());
    }
    let content = std::fs::read_to_string(&path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ToolConfig, ConfigError> {
    let config: ToolConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ToolConfig) -> Result<(), ConfigError> {
    if config.optimizer.rewrite_k < 2 {
        return Err(ConfigError::ValidationError(
            "optimizer.rewrite_k must be at least 2".to_string(),
        ));
    }
    if config.optimizer.resub_k < 2 {
        return Err(ConfigError::ValidationError(
            "optimizer.resub_k must be at least 2".to_string(),
        ));
    }
    if config.optimizer.max_cuts == 0 {
        return Err(ConfigError::ValidationError(
            "optimizer.max_cuts must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.optimizer.rewrite_k, 4);
    }

    #[test]
    fn overrides_apply() {
        let config = load_config_from_str(
            r#"
[optimizer]
rewrite_k = 3
resub_k = 6
activity_vectors = 256
"#,
        )
        .unwrap();
        assert_eq!(config.optimizer.rewrite_k, 3);
        assert_eq!(config.optimizer.resub_k, 6);
        assert_eq!(config.optimizer.activity_vectors, 256);
        assert_eq!(config.optimizer.max_divisors, 150);
    }

    #[test]
    fn bad_values_rejected() {
        assert!(load_config_from_str("[optimizer]\nrewrite_k = 1\n").is_err());
        assert!(load_config_from_str("[optimizer]\nmax_cuts = 0\n").is_err());
        assert!(load_config_from_str("not toml at all [").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Path::new("/definitely/missing/dir")).unwrap();
        assert_eq!(config.optimizer.resub_k, 8);
    }
}
