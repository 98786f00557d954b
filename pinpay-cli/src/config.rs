//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use pinpay_types::config::DEFAULT_ENVIRONMENT;
use pinpay_types::{ConfigError, PinConfig};

/// Gateway configuration. The database URL comes from the command line
/// (or `DATABASE_URL` through clap).
#[derive(Debug)]
pub struct Config {
    pub pin: PinConfig,
    /// Per-request gateway timeout; the transport default when unset
    pub timeout: Option<Duration>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    ///
    /// Reads `PIN_ENVIRONMENTS` (comma-separated names),
    /// `PIN_<NAME>_BASE_URL` and `PIN_<NAME>_SECRET_KEY` for each name,
    /// and the optional `PIN_DEFAULT_ENVIRONMENT` and `PIN_TIMEOUT_SECS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let default_environment = lookup("PIN_DEFAULT_ENVIRONMENT")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let names = lookup("PIN_ENVIRONMENTS").unwrap_or_default();
        let mut pin = PinConfig::new(default_environment);
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let prefix = format!("PIN_{}", name.to_uppercase());
            let setting = |field: &'static str, suffix: &str| {
                lookup(&format!("{}_{}", prefix, suffix)).ok_or_else(|| {
                    ConfigError::MissingSetting {
                        name: name.to_string(),
                        field,
                    }
                })
            };
            let base_url = setting("base_url", "BASE_URL")?;
            let secret_key = setting("secret_key", "SECRET_KEY")?;
            pin = pin.with_environment(name, base_url, secret_key);
        }
        if pin.environments.is_empty() {
            return Err(ConfigError::NoEnvironments.into());
        }

        let timeout = lookup("PIN_TIMEOUT_SECS")
            .map(|v| {
                v.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    ConfigError::Invalid(format!("PIN_TIMEOUT_SECS must be whole seconds, got '{}'", v))
                })
            })
            .transpose()?;

        Ok(Self {
            pin,
            timeout,
        })
    }
}
