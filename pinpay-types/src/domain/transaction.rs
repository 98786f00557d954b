//! Charge attempts against the gateway.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use pinpay_currency::{CurrencyCode, to_minor_units, value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::charge::ChargeOutcome;
use super::customer::CardType;
use super::ids::{CustomerTokenId, TransactionId};
use crate::config::EnvironmentResolver;
use crate::dto::{CardResponse, FormPayload};
use crate::error::PinError;

/// Where a transaction stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    /// Not yet sent to the gateway
    Unprocessed,
    /// Submitted, but no outcome was recorded. Needs manual reconciliation.
    InFlight,
    Succeeded,
    Failed,
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::Unprocessed => write!(f, "UNPROCESSED"),
            TransactionState::InFlight => write!(f, "IN_FLIGHT"),
            TransactionState::Succeeded => write!(f, "SUCCEEDED"),
            TransactionState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Cardholder details echoed by the gateway for an approved charge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub number: Option<String>,
    pub card_type: Option<CardType>,
}

impl From<&CardResponse> for CardDetails {
    fn from(card: &CardResponse) -> Self {
        Self {
            address1: card.address_line1.clone(),
            address2: card.address_line2.clone(),
            city: card.address_city.clone(),
            state: card.address_state.clone(),
            postcode: card.address_postcode.clone(),
            country: card.address_country.clone(),
            number: Some(card.display_number.clone()),
            card_type: Some(CardType::from(card.scheme.clone())),
        }
    }
}

/// One charge attempt, as recorded locally.
///
/// `processed` means an attempt was made; `succeeded` means the gateway
/// approved it. A record is processed at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinTransaction {
    pub id: TransactionId,
    /// When the record was created locally (may differ from the gateway's time)
    pub date: DateTime<Utc>,
    pub environment: String,
    /// Major units, e.g. dollars
    pub amount: Decimal,
    /// Fees charged by the gateway, in major units
    pub fees: Decimal,
    pub description: Option<String>,
    pub processed: bool,
    pub succeeded: bool,
    pub currency: CurrencyCode,
    pub transaction_token: Option<String>,
    pub card_token: Option<String>,
    pub customer_token: Option<CustomerTokenId>,
    /// Short status text, usually "Success!"
    pub pin_response: Option<String>,
    pub ip_address: IpAddr,
    pub email_address: String,
    pub card: CardDetails,
    /// Complete raw response body
    pub pin_response_text: Option<String>,
}

impl PinTransaction {
    pub fn state(&self) -> TransactionState {
        if !self.processed {
            TransactionState::Unprocessed
        } else if self.succeeded {
            TransactionState::Succeeded
        } else if self.pin_response.is_none() {
            TransactionState::InFlight
        } else {
            TransactionState::Failed
        }
    }

    /// Amount in integer minor units, as the gateway expects it.
    pub fn amount_minor_units(&self) -> Result<i64, PinError> {
        Ok(to_minor_units(self.amount, self.currency)?)
    }

    /// Builds the `/charges` form.
    ///
    /// `customer_token` is the gateway token of the linked customer, looked
    /// up by the caller; it is only used when no card token is set.
    pub fn charge_payload(&self, customer_token: Option<&str>) -> Result<FormPayload, PinError> {
        let mut form = FormPayload::new()
            .field("email", &self.email_address)
            .field("description", self.description.as_deref().unwrap_or_default())
            .field("amount", self.amount_minor_units()?)
            .field("currency", self.currency)
            .field("ip_address", self.ip_address);

        form = match (self.card_token.as_deref(), customer_token) {
            (Some(card), _) => form.field("card_token", card),
            (None, Some(customer)) => form.field("customer_token", customer),
            (None, None) => {
                return Err(PinError::Validation(
                    "Must provide card_token or customer_token".into(),
                ));
            }
        };

        Ok(form)
    }

    /// Folds an interpreted gateway answer into the record and returns the
    /// status message.
    pub fn apply_outcome(&mut self, outcome: ChargeOutcome) -> String {
        let message = match outcome {
            ChargeOutcome::Unparseable => "Failure.".to_string(),
            ChargeOutcome::Declined {
                message,
                charge_token,
            } => {
                self.transaction_token = charge_token;
                format!("Failure: {}", message)
            }
            ChargeOutcome::Approved(data) => {
                self.succeeded = true;
                self.transaction_token = Some(data.token);
                if let Some(total_fees) = data.total_fees {
                    self.fees = value(total_fees, self.currency);
                }
                self.card = CardDetails::from(&data.card);
                data.status_message
            }
        };

        self.pin_response = Some(message.clone());
        message
    }
}

impl std::fmt::Display for PinTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A transaction as submitted by a caller, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPinTransaction {
    /// Empty means the configured default
    #[serde(default)]
    pub environment: String,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub card_token: Option<String>,
    #[serde(default)]
    pub customer_token: Option<CustomerTokenId>,
    pub ip_address: IpAddr,
    pub email_address: String,
}

impl NewPinTransaction {
    /// Checks every invariant a stored transaction must hold.
    ///
    /// # Validation
    /// - exactly one of `card_token` / `customer_token`
    /// - the environment exists (an empty one becomes the default)
    /// - amount is positive, has no digits past the currency's minor unit
    ///   and fits in minor units
    /// - email is not blank
    pub fn validate(
        mut self,
        environments: &EnvironmentResolver,
    ) -> Result<ValidatedTransaction, PinError> {
        self.card_token = self
            .card_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        match (&self.card_token, &self.customer_token) {
            (None, None) => {
                return Err(PinError::Validation(
                    "Must provide card_token or customer_token".into(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(PinError::Validation(
                    "Can only provide card_token OR customer_token, not both".into(),
                ));
            }
            _ => {}
        }

        self.environment = environments.canonical_name(&self.environment)?;

        if self.amount <= Decimal::ZERO {
            return Err(PinError::Validation("Amount must be positive".into()));
        }
        // the stored amount must be exactly what gets charged
        if self.amount.normalize().scale() > self.currency.exponent() {
            return Err(PinError::Validation(format!(
                "Amount {} has more than {} decimal places for {}",
                self.amount,
                self.currency.exponent(),
                self.currency
            )));
        }
        to_minor_units(self.amount, self.currency)?;

        if self.email_address.trim().is_empty() {
            return Err(PinError::Validation("Email address is required".into()));
        }

        Ok(ValidatedTransaction {
            draft: self,
            date: Utc::now(),
        })
    }
}

/// A transaction that passed [`NewPinTransaction::validate`]. Stores only
/// accept this type.
#[derive(Debug, Clone)]
pub struct ValidatedTransaction {
    draft: NewPinTransaction,
    date: DateTime<Utc>,
}

impl ValidatedTransaction {
    pub fn draft(&self) -> &NewPinTransaction {
        &self.draft
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// The unprocessed record this draft becomes once the store assigns `id`.
    pub fn into_transaction(self, id: TransactionId) -> PinTransaction {
        let draft = self.draft;
        PinTransaction {
            id,
            date: self.date,
            environment: draft.environment,
            amount: draft.amount,
            fees: Decimal::new(0, 2),
            description: draft.description,
            processed: false,
            succeeded: false,
            currency: draft.currency,
            transaction_token: None,
            card_token: draft.card_token,
            customer_token: draft.customer_token,
            pin_response: None,
            ip_address: draft.ip_address,
            email_address: draft.email_address,
            card: CardDetails::default(),
            pin_response_text: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinConfig;
    use crate::dto::ChargeResponse;
    use rust_decimal_macros::dec;

    fn resolver() -> EnvironmentResolver {
        EnvironmentResolver::new(
            PinConfig::new("test")
                .with_environment("test", "https://test-api.pinpayments.com/1", "sk_test"),
        )
        .unwrap()
    }

    fn draft() -> NewPinTransaction {
        NewPinTransaction {
            environment: String::new(),
            amount: dec!(10.00),
            currency: CurrencyCode::AUD,
            description: Some("Widgets".into()),
            card_token: Some("card_nytGw7koRg23EEp9NTmz9w".into()),
            customer_token: None,
            ip_address: "203.0.113.7".parse().unwrap(),
            email_address: "roland@pinpayments.com".into(),
        }
    }

    fn unprocessed() -> PinTransaction {
        draft()
            .validate(&resolver())
            .unwrap()
            .into_transaction(TransactionId::new(1))
    }

    #[test]
    fn test_validate_fills_default_environment() {
        let validated = draft().validate(&resolver()).unwrap();
        assert_eq!(validated.draft().environment, "test");
    }

    #[test]
    fn test_validate_requires_a_token() {
        let mut tx = draft();
        tx.card_token = None;
        let result = tx.validate(&resolver());
        assert!(matches!(result, Err(PinError::Validation(msg)) if msg.contains("Must provide")));
    }

    #[test]
    fn test_validate_blank_card_token_counts_as_missing() {
        let mut tx = draft();
        tx.card_token = Some("   ".into());
        assert!(matches!(
            tx.validate(&resolver()),
            Err(PinError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_both_tokens() {
        let mut tx = draft();
        tx.customer_token = Some(CustomerTokenId::new(3));
        let result = tx.validate(&resolver());
        assert!(matches!(result, Err(PinError::Validation(msg)) if msg.contains("not both")));
    }

    #[test]
    fn test_validate_rejects_unknown_environment() {
        let mut tx = draft();
        tx.environment = "live".into();
        assert!(matches!(
            tx.validate(&resolver()),
            Err(PinError::UnknownEnvironment(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_amount() {
        let mut tx = draft();
        tx.amount = dec!(0);
        assert!(matches!(
            tx.validate(&resolver()),
            Err(PinError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_sub_minor_unit_amount() {
        let mut tx = draft();
        tx.amount = dec!(12.349);
        assert!(matches!(
            tx.validate(&resolver()),
            Err(PinError::Validation(msg)) if msg.contains("decimal places")
        ));

        let mut yen = draft();
        yen.currency = CurrencyCode::JPY;
        yen.amount = dec!(120.7);
        assert!(matches!(
            yen.validate(&resolver()),
            Err(PinError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_trailing_zeros() {
        let mut tx = draft();
        tx.amount = dec!(12.3400);
        let validated = tx.validate(&resolver()).unwrap();
        assert_eq!(validated.draft().amount, dec!(12.34));

        let mut yen = draft();
        yen.currency = CurrencyCode::JPY;
        yen.amount = dec!(120.0);
        assert!(yen.validate(&resolver()).is_ok());
    }

    #[test]
    fn test_new_transaction_is_unprocessed() {
        let tx = unprocessed();
        assert_eq!(tx.state(), TransactionState::Unprocessed);
        assert_eq!(tx.fees.to_string(), "0.00");
    }

    #[test]
    fn test_charge_payload_with_card_token() {
        let tx = unprocessed();
        let form = tx.charge_payload(None).unwrap();
        assert_eq!(form.get("amount"), Some("1000"));
        assert_eq!(form.get("currency"), Some("AUD"));
        assert_eq!(form.get("ip_address"), Some("203.0.113.7"));
        assert_eq!(form.get("card_token"), Some("card_nytGw7koRg23EEp9NTmz9w"));
        assert_eq!(form.get("customer_token"), None);
    }

    #[test]
    fn test_charge_payload_with_customer_token() {
        let mut tx = unprocessed();
        tx.card_token = None;
        tx.customer_token = Some(CustomerTokenId::new(9));
        let form = tx.charge_payload(Some("cus_abc")).unwrap();
        assert_eq!(form.get("customer_token"), Some("cus_abc"));
        assert_eq!(form.get("card_token"), None);
    }

    #[test]
    fn test_charge_payload_truncates_sub_cent_amounts() {
        let mut tx = unprocessed();
        tx.amount = dec!(12.349);
        let form = tx.charge_payload(None).unwrap();
        assert_eq!(form.get("amount"), Some("1234"));
    }

    #[test]
    fn test_apply_unparseable() {
        let mut tx = unprocessed();
        tx.processed = true;
        let message = tx.apply_outcome(ChargeOutcome::Unparseable);
        assert_eq!(message, "Failure.");
        assert!(!tx.succeeded);
        assert_eq!(tx.state(), TransactionState::Failed);
    }

    #[test]
    fn test_apply_declined_keeps_charge_token() {
        let mut tx = unprocessed();
        tx.processed = true;
        tx.apply_outcome(ChargeOutcome::Declined {
            message: "Insufficient funds".into(),
            charge_token: Some("ch_partial".into()),
        });
        assert_eq!(tx.pin_response.as_deref(), Some("Failure: Insufficient funds"));
        assert_eq!(tx.transaction_token.as_deref(), Some("ch_partial"));
        assert!(!tx.succeeded);
    }

    #[test]
    fn test_apply_approved() {
        let mut tx = unprocessed();
        tx.processed = true;
        let message = tx.apply_outcome(ChargeOutcome::Approved(ChargeResponse {
            token: "ch_lfUYEBK14zotCTykezJkfg".into(),
            total_fees: Some(500),
            status_message: "Success".into(),
            card: CardResponse {
                display_number: "XXXX-XXXX-XXXX-0000".into(),
                scheme: "master".into(),
                address_city: Some("Lathlain".into()),
                address_country: Some("Australia".into()),
                ..Default::default()
            },
        }));

        assert_eq!(message, "Success");
        assert!(tx.succeeded);
        assert_eq!(tx.fees, dec!(5.00));
        assert_eq!(tx.card.city.as_deref(), Some("Lathlain"));
        assert_eq!(tx.card.card_type, Some(CardType::Master));
        assert_eq!(tx.state(), TransactionState::Succeeded);
    }

    #[test]
    fn test_processed_without_outcome_is_in_flight() {
        let mut tx = unprocessed();
        tx.processed = true;
        assert_eq!(tx.state(), TransactionState::InFlight);
    }
}
