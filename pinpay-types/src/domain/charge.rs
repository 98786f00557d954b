//! Interpretation of `/charges` responses.
//!
//! The gateway answers a charge with one of three shapes: something that is
//! not JSON at all, an error object (`error`, `error_description`, optional
//! `messages[]`, optional `charge_token`), or a success envelope with a
//! `response` object. [`ChargeOutcome::interpret`] maps each to a variant.

use serde_json::Value;

use crate::dto::{ChargeResponse, Envelope};
use crate::error::PinError;

#[derive(Debug, Clone)]
pub enum ChargeOutcome {
    /// Body was not JSON
    Unparseable,
    /// Gateway reported an error; no money moved
    Declined {
        message: String,
        /// Partial charge token, kept for reconciliation
        charge_token: Option<String>,
    },
    Approved(ChargeResponse),
}

impl ChargeOutcome {
    /// Classifies a parsed body (`None` when the body was not JSON).
    ///
    /// # Errors
    /// [`PinError::MalformedResponse`] when the body has no `error` key but
    /// the success envelope is missing required fields.
    pub fn interpret(json: Option<&Value>) -> Result<Self, PinError> {
        let Some(json) = json else {
            return Ok(ChargeOutcome::Unparseable);
        };

        if json.get("error").is_some() {
            return Ok(ChargeOutcome::Declined {
                message: error_message(json),
                charge_token: json
                    .get("charge_token")
                    .and_then(Value::as_str)
                    .map(String::from),
            });
        }

        let envelope: Envelope<ChargeResponse> = serde_json::from_value(json.clone())
            .map_err(|e| PinError::MalformedResponse(e.to_string()))?;

        Ok(ChargeOutcome::Approved(envelope.response))
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ChargeOutcome::Approved(_))
    }
}

/// Human-readable message from a gateway error body.
///
/// Prefers `messages[0].message`, then `error_description`, then the bare
/// `error` code.
pub fn error_message(json: &Value) -> String {
    json.get("messages")
        .and_then(|messages| messages.get(0))
        .and_then(|first| first.get("message"))
        .and_then(Value::as_str)
        .or_else(|| json.get("error_description").and_then(Value::as_str))
        .or_else(|| json.get("error").and_then(Value::as_str))
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unparseable() {
        let outcome = ChargeOutcome::interpret(None).unwrap();
        assert!(matches!(outcome, ChargeOutcome::Unparseable));
    }

    #[test]
    fn test_error_description_fallback() {
        let body = json!({
            "error": "insufficient_funds",
            "error_description": "Insufficient funds",
        });
        let outcome = ChargeOutcome::interpret(Some(&body)).unwrap();
        match outcome {
            ChargeOutcome::Declined {
                message,
                charge_token,
            } => {
                assert_eq!(message, "Insufficient funds");
                assert_eq!(charge_token, None);
            }
            other => panic!("expected Declined, got {:?}", other),
        }
    }

    #[test]
    fn test_messages_take_precedence() {
        let body = json!({
            "error": "invalid_resource",
            "error_description": "One or more parameters were missing or invalid",
            "charge_token": "ch_partial",
            "messages": [
                { "code": "card_declined", "message": "The card was declined" }
            ],
        });
        let outcome = ChargeOutcome::interpret(Some(&body)).unwrap();
        match outcome {
            ChargeOutcome::Declined {
                message,
                charge_token,
            } => {
                assert_eq!(message, "The card was declined");
                assert_eq!(charge_token.as_deref(), Some("ch_partial"));
            }
            other => panic!("expected Declined, got {:?}", other),
        }
    }

    #[test]
    fn test_messages_without_message_field_fall_back() {
        let body = json!({
            "error": "invalid_resource",
            "error_description": "Bad card",
            "messages": [{ "code": "number_invalid" }],
        });
        assert_eq!(error_message(&body), "Bad card");
    }

    #[test]
    fn test_bare_error_code() {
        let body = json!({ "error": "unauthenticated" });
        assert_eq!(error_message(&body), "unauthenticated");
    }

    #[test]
    fn test_success() {
        let body = json!({
            "response": {
                "token": "ch_lfUYEBK14zotCTykezJkfg",
                "success": true,
                "total_fees": 42,
                "status_message": "Success",
                "card": {
                    "display_number": "XXXX-XXXX-XXXX-0000",
                    "scheme": "master",
                    "address_line1": "42 Sevenoaks St",
                    "address_line2": null,
                    "address_city": "Lathlain",
                    "address_postcode": "6454",
                    "address_state": "WA",
                    "address_country": "Australia"
                }
            }
        });
        let outcome = ChargeOutcome::interpret(Some(&body)).unwrap();
        assert!(outcome.is_approved());
        if let ChargeOutcome::Approved(data) = outcome {
            assert_eq!(data.total_fees, Some(42));
            assert_eq!(data.card.address_line2, None);
        }
    }

    #[test]
    fn test_success_missing_keys_is_malformed() {
        let body = json!({ "response": { "token": "ch_1" } });
        let result = ChargeOutcome::interpret(Some(&body));
        assert!(matches!(result, Err(PinError::MalformedResponse(_))));
    }
}
