// Configuration management for the PumpLink CLI
//
// Engine settings stored as JSON in:
// - macOS: ~/Library/Application Support/pumplink/config.json
// - Linux: ~/.config/pumplink/config.json
// - Windows: %APPDATA%\pumplink\config.json

use anyhow::{Context, Result};
use pumplink_core::EngineConfig;
use std::path::{Path, PathBuf};

/// Get the config directory path (cross-platform)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Failed to determine config directory")?
        .join("pumplink");

    std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

/// Get the config file path
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load config from the default location, or defaults if none is stored
pub fn load() -> Result<EngineConfig> {
    load_from(&config_file()?)
}

pub fn load_from(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: EngineConfig =
        serde_json::from_str(&contents).context("Failed to parse config file")?;
    config.validate().context("Stored config is invalid")?;
    Ok(config)
}

/// Validate and save config to the default location
pub fn save(config: &EngineConfig) -> Result<()> {
    save_to(config, &config_file()?)
}

pub fn save_to(config: &EngineConfig, path: &Path) -> Result<()> {
    config.validate().context("Refusing to save invalid config")?;
    let contents = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pumplink_core::MismatchPolicy;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = EngineConfig::default();
        config.set("write_timeout_ms", "1500").unwrap();
        config.set("mismatch_policy", "strict").unwrap();
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.write_timeout_ms, 1500);
        assert_eq!(loaded.mismatch_policy, MismatchPolicy::Strict);
    }

    #[test]
    fn test_invalid_config_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = EngineConfig {
            read_timeout_ms: 0,
            ..Default::default()
        };
        assert!(save_to(&config, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_from(&path).is_err());
    }
}
