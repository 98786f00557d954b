//! # Pinpay Types
//!
//! Domain types and port traits for the Pin Payments integration.
//! This crate has no IO of its own - only data structures, response
//! interpretation rules, and trait definitions.
//!
//! ## Architecture
//!
//! - `domain/` - Records (customer tokens, transactions, recipients, transfers)
//! - `ports/` - Gateway and repository traits that adapters implement
//! - `dto/` - Gateway request/response shapes
//! - `config/` - Environment configuration and resolution
//! - `error/` - Error taxonomy

pub mod config;
pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use config::{EnvironmentConfig, EnvironmentResolver, PinConfig, PinEnvironment};
pub use domain::*;
pub use dto::*;
pub use error::{ConfigError, GatewayError, PinError, RepoError};
pub use pinpay_currency::{CurrencyCode, CurrencyError};
pub use ports::{Gateway, GatewayResponse, PinRepository};
