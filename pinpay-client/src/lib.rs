//! # Pinpay Client
//!
//! `reqwest` implementation of the [`Gateway`] port.
//!
//! Requests are form-encoded and signed with HTTP Basic auth, the
//! environment's secret key as username and an empty password.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::{debug, warn};

use pinpay_types::{FormPayload, Gateway, GatewayError, GatewayResponse, PinEnvironment};

/// Pin Payments API client.
///
/// Holds no credentials itself; each call is signed for the environment it
/// is given, so one client serves every configured environment.
#[derive(Debug, Clone)]
pub struct PinClient {
    http: Client,
}

impl PinClient {
    /// Creates a client with the transport's default timeouts.
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Creates a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self { http })
    }

    async fn send(
        &self,
        method: Method,
        env: &PinEnvironment,
        path: &str,
        form: &FormPayload,
        capture_response: bool,
    ) -> Result<GatewayResponse, GatewayError> {
        let url = env.url(path);
        debug!(environment = %env.name, %method, %url, "Sending gateway request");

        let resp = self
            .http
            .request(method, &url)
            .basic_auth(&env.secret_key, Some(""))
            .form(form)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport)?;
        let response = GatewayResponse::new(status, body);

        debug!(
            status,
            json = response.json.is_some(),
            "Gateway responded"
        );

        if response.is_error_status() && !capture_response {
            let message = response.error_message();
            warn!(status, %message, %url, "Gateway rejected request");
            return Err(GatewayError::Rejected { status, message });
        }

        Ok(response)
    }
}

impl Default for PinClient {
    fn default() -> Self {
        Self::new()
    }
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.to_string())
}

#[async_trait]
impl Gateway for PinClient {
    async fn post(
        &self,
        env: &PinEnvironment,
        path: &str,
        form: &FormPayload,
        capture_response: bool,
    ) -> Result<GatewayResponse, GatewayError> {
        self.send(Method::POST, env, path, form, capture_response)
            .await
    }

    async fn put(
        &self,
        env: &PinEnvironment,
        path: &str,
        form: &FormPayload,
    ) -> Result<GatewayResponse, GatewayError> {
        self.send(Method::PUT, env, path, form, false).await
    }
}
