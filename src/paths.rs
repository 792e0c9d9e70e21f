//! Centralized path resolution for geosearch files.
//!
//! All paths respect an environment override first and fall back to the
//! platform directory from [`dirs`].

use std::path::PathBuf;

/// Environment variable overriding [`config_dir`].
pub const CONFIG_DIR_ENV: &str = "GEOSEARCH_CONFIG_DIR";

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/geosearch/` by default. Override with
/// the `GEOSEARCH_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("geosearch"))
        .unwrap_or_else(|| std::env::temp_dir().join("geosearch-config"))
}

/// Default configuration file (`config_dir()/config.toml`).
#[must_use]
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}
