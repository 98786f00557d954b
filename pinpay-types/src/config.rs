//! Gateway environment configuration and resolution.
//!
//! A [`PinConfig`] maps environment names (e.g. `test`, `live`) to the base
//! URL and secret key used against that environment. It is validated once,
//! when the [`EnvironmentResolver`] is built, and never read from ambient
//! state afterwards.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PinError};

/// Environment name used when none is configured as the default.
pub const DEFAULT_ENVIRONMENT: &str = "test";

/// Credentials for one gateway environment.
#[derive(Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// API root, e.g. `https://test-api.pinpayments.com/1`
    pub base_url: String,
    pub secret_key: String,
}

impl fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Environment name → credentials, plus the default environment name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinConfig {
    pub environments: BTreeMap<String, EnvironmentConfig>,
    pub default_environment: String,
}

impl PinConfig {
    pub fn new(default_environment: impl Into<String>) -> Self {
        Self {
            environments: BTreeMap::new(),
            default_environment: default_environment.into(),
        }
    }

    /// Adds (or replaces) an environment.
    pub fn with_environment(
        mut self,
        name: impl Into<String>,
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.environments.insert(
            name.into(),
            EnvironmentConfig {
                base_url: base_url.into(),
                secret_key: secret_key.into(),
            },
        );
        self
    }
}

/// A resolved environment, ready to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub struct PinEnvironment {
    pub name: String,
    pub base_url: String,
    pub secret_key: String,
}

impl PinEnvironment {
    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for PinEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinEnvironment")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Resolves environment names against a validated [`PinConfig`].
#[derive(Debug, Clone)]
pub struct EnvironmentResolver {
    config: PinConfig,
}

impl EnvironmentResolver {
    /// Validates the configuration.
    ///
    /// # Errors
    /// - [`ConfigError::NoEnvironments`] if nothing is configured
    /// - [`ConfigError::UnknownDefault`] if the default is not among them
    /// - [`ConfigError::MissingSetting`] if an environment has an empty URL or key
    pub fn new(config: PinConfig) -> Result<Self, ConfigError> {
        if config.environments.is_empty() {
            return Err(ConfigError::NoEnvironments);
        }

        for (name, env) in &config.environments {
            if env.base_url.trim().is_empty() {
                return Err(ConfigError::MissingSetting {
                    name: name.clone(),
                    field: "base_url",
                });
            }
            if env.secret_key.trim().is_empty() {
                return Err(ConfigError::MissingSetting {
                    name: name.clone(),
                    field: "secret_key",
                });
            }
        }

        if !config.environments.contains_key(&config.default_environment) {
            return Err(ConfigError::UnknownDefault(config.default_environment));
        }

        Ok(Self { config })
    }

    pub fn default_name(&self) -> &str {
        &self.config.default_environment
    }

    /// Returns the environment name a record should carry: the default when
    /// `name` is empty, `name` itself when it is configured.
    pub fn canonical_name(&self, name: &str) -> Result<String, PinError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(self.config.default_environment.clone());
        }
        if self.config.environments.contains_key(name) {
            Ok(name.to_string())
        } else {
            Err(PinError::UnknownEnvironment(name.to_string()))
        }
    }

    /// Resolves `name` (or the default, when empty) to its credentials.
    pub fn resolve(&self, name: &str) -> Result<PinEnvironment, PinError> {
        let name = self.canonical_name(name)?;
        let env = self
            .config
            .environments
            .get(&name)
            .ok_or_else(|| PinError::UnknownEnvironment(name.clone()))?;

        Ok(PinEnvironment {
            base_url: env.base_url.clone(),
            secret_key: env.secret_key.clone(),
            name,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.config.environments.keys().map(String::as_str)
    }
}
