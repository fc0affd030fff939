//! Configuration loading from `~/.swarmcall/config.toml` with defaults.

use std::path::{Path, PathBuf};
use swarmcall_types::config::NodeConfig;
use tracing::{info, warn};

/// Load node configuration from a TOML file, falling back to defaults when
/// the file is missing or unreadable.
pub fn load_config(path: Option<&Path>) -> NodeConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return NodeConfig::default();
    }

    let contents = match std::fs::read_to_string(&config_path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config, using defaults"
            );
            return NodeConfig::default();
        }
    };

    match toml::from_str::<NodeConfig>(&contents) {
        Ok(config) => {
            info!(path = %config_path.display(), "Loaded configuration");
            config
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to parse config, using defaults"
            );
            NodeConfig::default()
        }
    }
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".swarmcall")
        .join("config.toml")
}
