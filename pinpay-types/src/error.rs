//! Error types for the Pin Payments integration.

use pinpay_currency::CurrencyError;

/// Configuration problems detected at startup. Not recoverable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No Pin environments configured")]
    NoEnvironments,

    #[error("Default Pin environment '{0}' is not configured")]
    UnknownDefault(String),

    #[error("Pin environment '{name}' is missing {field}")]
    MissingSetting { name: String, field: &'static str },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures talking to the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway answered with an error status or an error body.
    #[error("Gateway rejected request: {status} - {message}")]
    Rejected { status: u16, message: String },
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by Pin operations.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    /// Local record state is invalid; raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Pin environment '{0}' does not exist")]
    UnknownEnvironment(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The gateway answered but a required key was absent or mistyped.
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Currency(#[from] CurrencyError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl PinError {
    /// True when the failure happened before anything left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PinError::Validation(_)
                | PinError::UnknownEnvironment(_)
                | PinError::NotFound(_)
                | PinError::Currency(_)
        )
    }
}
