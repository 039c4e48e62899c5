pub mod types;

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use types::Config;

const CONFIG_FILE_NAME: &str = ".cost-attribution.toml";

/// Get the global config file path (~/.cost-attribution.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (<dir>/.cost-attribution.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration.
///
/// An explicit file must load. Otherwise the local config in `dir` is tried
/// first, then the global config, then defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        let content = fs::read_to_string(path)?;
        return parse_config(&content);
    }

    let candidates = std::iter::once(local_config_path(dir)).chain(global_config_path());
    for path in candidates {
        if !path.exists() {
            continue;
        }
        match fs::read_to_string(&path).map_err(Into::into).and_then(|c| parse_config(&c)) {
            Ok(config) => {
                log::debug!("Loaded configuration from {}", path.display());
                return Ok(config);
            }
            Err(e) => log::warn!("Ignoring config file {}: {}", path.display(), e),
        }
    }

    Ok(Config::default())
}

fn parse_config(content: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(content).map_err(|e| ConfigError::ParsingFailed(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.top_k == 0 {
        return Err(ConfigError::InvalidConfig("top_k must be at least 1".to_string()).into());
    }
    if config.lookback_days == 0 {
        return Err(
            ConfigError::InvalidConfig("lookback_days must be at least 1".to_string()).into(),
        );
    }
    Ok(())
}
