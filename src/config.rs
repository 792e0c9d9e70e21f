//! Application configuration loaded from TOML.
//!
//! ```toml
//! [router]
//! providers = ["brave", "serper", "mojeek"]
//! timeout_seconds = 10
//!
//! [router.cost]
//! daily_miss_budget = 1500
//!
//! [credentials]
//! brave = "..."
//! ```
//!
//! Server-owned keys may also come from `GEOSEARCH_BRAVE_API_KEY`,
//! `GEOSEARCH_SERPER_API_KEY` and `GEOSEARCH_MOJEEK_API_KEY`, which take
//! precedence over the file.

use geosearch_core::{Credentials, ProviderId, RouterConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{AppError, Result};

/// Operator-owned provider keys.
///
/// Requests made with these keys consume the daily miss budget and may
/// be cached.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerCredentials {
    /// Brave Search subscription token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brave: Option<String>,
    /// Serper API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serper: Option<String>,
    /// Mojeek API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mojeek: Option<String>,
}

impl ServerCredentials {
    /// Environment variable holding the server key for `provider`.
    pub fn env_var(provider: ProviderId) -> &'static str {
        match provider {
            ProviderId::Brave => "GEOSEARCH_BRAVE_API_KEY",
            ProviderId::Serper => "GEOSEARCH_SERPER_API_KEY",
            ProviderId::Mojeek => "GEOSEARCH_MOJEEK_API_KEY",
        }
    }

    fn slot(&mut self, provider: ProviderId) -> &mut Option<String> {
        match provider {
            ProviderId::Brave => &mut self.brave,
            ProviderId::Serper => &mut self.serper,
            ProviderId::Mojeek => &mut self.mojeek,
        }
    }

    /// Key for `provider`, if set and non-blank.
    pub fn get(&self, provider: ProviderId) -> Option<&str> {
        let key = match provider {
            ProviderId::Brave => &self.brave,
            ProviderId::Serper => &self.serper,
            ProviderId::Mojeek => &self.mojeek,
        };
        key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Overwrite keys from variables returned by `lookup`.
    ///
    /// Blank values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for provider in ProviderId::all() {
            if let Some(value) = lookup(Self::env_var(*provider)) {
                if !value.trim().is_empty() {
                    tracing::debug!(%provider, "server key taken from environment");
                    *self.slot(*provider) = Some(value);
                }
            }
        }
    }

    /// Providers with a usable key, in default priority order.
    pub fn configured(&self) -> Vec<ProviderId> {
        ProviderId::all()
            .iter()
            .copied()
            .filter(|p| self.get(*p).is_some())
            .collect()
    }
}

impl fmt::Debug for ServerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerCredentials")
            .field("configured", &self.configured())
            .finish()
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Routing engine settings.
    pub router: RouterConfig,
    /// Operator-owned provider keys.
    pub credentials: ServerCredentials,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `path`, or the default path when `None`, then apply
    /// environment overrides and validate.
    ///
    /// A missing default file yields the default config; a missing
    /// explicit file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the
    /// resulting router config is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = crate::paths::default_config_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    tracing::debug!(path = %default.display(), "no config file; using defaults");
                    Self::default()
                }
            }
        };
        config
            .credentials
            .apply_env_with(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Validate the router section.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Search`] wrapping the config error.
    pub fn validate(&self) -> Result<()> {
        self.router.validate()?;
        Ok(())
    }

    /// Credentials for a request: configured server keys plus `user` keys.
    pub fn credentials_with_user(&self, user: impl IntoIterator<Item = (ProviderId, String)>) -> Credentials {
        let mut credentials = Credentials::default();
        for provider in self.credentials.configured() {
            if let Some(key) = self.credentials.get(provider) {
                credentials = credentials.with_server(provider, key);
            }
        }
        for (provider, key) in user {
            credentials = credentials.with_user(provider, key);
        }
        credentials
    }
}
