//! Outbound transfers to recipients.

use chrono::{DateTime, Utc};
use pinpay_currency::{CurrencyCode, value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{RecipientId, TransferId};
use crate::dto::TransferResponse;
use crate::error::PinError;

/// A transfer from the merchant balance to a [`PinRecipient`](super::PinRecipient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinTransfer {
    pub id: TransferId,
    pub transfer_token: Option<String>,
    /// Status at the time the record was saved
    pub status: Option<String>,
    pub currency: CurrencyCode,
    /// As shown on the statement
    pub description: Option<String>,
    /// Minor units (cents for AUD, yen for JPY)
    pub amount: i64,
    /// Cleared if the recipient row is removed
    pub recipient: Option<RecipientId>,
    pub created: DateTime<Utc>,
    pub pin_response_text: Option<String>,
    pub environment: String,
}

impl PinTransfer {
    /// Amount in the currency's major unit, without symbols: 1000 cents is
    /// `10.00`, 1000 yen is `1000`.
    pub fn value(&self) -> Decimal {
        value(self.amount, self.currency)
    }
}

impl std::fmt::Display for PinTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.transfer_token {
            Some(token) => write!(f, "{}", token),
            None => write!(f, "{}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPinTransfer {
    pub transfer_token: String,
    pub status: String,
    pub currency: CurrencyCode,
    pub description: Option<String>,
    pub amount: i64,
    pub recipient: RecipientId,
    pub pin_response_text: String,
    pub environment: String,
}

impl NewPinTransfer {
    pub fn from_response(
        data: TransferResponse,
        recipient: RecipientId,
        environment: &str,
        raw_body: String,
    ) -> Result<Self, PinError> {
        let currency = data
            .currency
            .parse::<CurrencyCode>()
            .map_err(|e| PinError::MalformedResponse(e.to_string()))?;

        Ok(Self {
            transfer_token: data.token,
            status: data.status,
            currency,
            description: data.description,
            amount: data.amount,
            recipient,
            pin_response_text: raw_body,
            environment: environment.to_string(),
        })
    }
}
