//! Gateway port.
//!
//! One implementation talks HTTP to Pin (`pinpay-client`); tests script
//! responses in memory.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::PinEnvironment;
use crate::domain::charge::error_message;
use crate::dto::{Envelope, FormPayload};
use crate::error::{GatewayError, PinError};

/// Raw gateway answer plus its defensively parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
    /// `None` when the body is not valid JSON
    pub json: Option<Value>,
}

impl GatewayResponse {
    /// Wraps a raw answer, parsing the body if it is JSON.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let json = serde_json::from_str(&body).ok();
        Self { status, body, json }
    }

    pub fn is_error_status(&self) -> bool {
        self.status >= 400
    }

    /// True if the body carries a top-level `error` key.
    pub fn has_error(&self) -> bool {
        self.json
            .as_ref()
            .is_some_and(|json| json.get("error").is_some())
    }

    /// Best message available for a failed request.
    pub fn error_message(&self) -> String {
        match &self.json {
            Some(json) => error_message(json),
            None => format!("HTTP {}", self.status),
        }
    }

    /// Decodes the `response` object of a successful call.
    ///
    /// # Errors
    /// - [`GatewayError::Rejected`] if the status or body reports an error
    /// - [`PinError::MalformedResponse`] if the body is not JSON or lacks keys
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, PinError> {
        if self.is_error_status() || self.has_error() {
            return Err(GatewayError::Rejected {
                status: self.status,
                message: self.error_message(),
            }
            .into());
        }

        let json = self
            .json
            .ok_or_else(|| PinError::MalformedResponse("body is not JSON".into()))?;
        let envelope: Envelope<T> = serde_json::from_value(json)
            .map_err(|e| PinError::MalformedResponse(e.to_string()))?;
        Ok(envelope.response)
    }
}

/// Port trait for the payment gateway's HTTP API.
///
/// Every call is a single attempt. Implementations never touch local state.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// POSTs `form` to `path` in `env`.
    ///
    /// With `capture_response` unset, an HTTP error status is returned as
    /// [`GatewayError::Rejected`]; with it set, every HTTP answer comes back
    /// as a [`GatewayResponse`] for the caller to interpret.
    async fn post(
        &self,
        env: &PinEnvironment,
        path: &str,
        form: &FormPayload,
        capture_response: bool,
    ) -> Result<GatewayResponse, GatewayError>;

    /// PUTs `form` to `path` in `env`. HTTP error statuses are rejected.
    async fn put(
        &self,
        env: &PinEnvironment,
        path: &str,
        form: &FormPayload,
    ) -> Result<GatewayResponse, GatewayError>;
}
