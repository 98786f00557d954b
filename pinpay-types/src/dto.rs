//! Data Transfer Objects: gateway response bodies and service requests.

use serde::{Deserialize, Deserializer, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Gateway response bodies
// ─────────────────────────────────────────────────────────────────────────────

/// Successful gateway responses wrap their payload in a `response` key.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub response: T,
}

/// Card details as echoed back by the gateway (never the full PAN).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardResponse {
    /// Masked number, e.g. `XXXX-XXXX-XXXX-0000`
    pub display_number: String,
    pub scheme: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub address_city: Option<String>,
    #[serde(default)]
    pub address_state: Option<String>,
    #[serde(default)]
    pub address_postcode: Option<String>,
    #[serde(default)]
    pub address_country: Option<String>,
}

/// `POST /customers` and `PUT /customers/{token}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerResponse {
    pub token: String,
    pub card: CardResponse,
}

/// `POST /charges` on success.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeResponse {
    pub token: String,
    /// Fees in minor units; absent while the charge is still pending.
    #[serde(default)]
    pub total_fees: Option<i64>,
    pub status_message: String,
    pub card: CardResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BankAccountResponse {
    pub token: String,
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub bsb: String,
    pub number: String,
    pub bank_name: String,
    #[serde(default)]
    pub branch: Option<String>,
}

/// `POST /recipients`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipientResponse {
    pub token: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub bank_account: BankAccountResponse,
}

/// `POST /transfers`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferResponse {
    pub token: String,
    pub status: String,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: i64,
}

/// Routing codes arrive as strings, but some payloads send bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway request bodies
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered form fields for a gateway request.
///
/// Nested gateway parameters use bracket keys, e.g. `bank_account[bsb]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormPayload(Vec<(String, String)>);

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.push((key.into(), value.to_string()));
        self
    }

    /// Adds `parent[key]`.
    pub fn nested(self, parent: &str, key: &str, value: impl ToString) -> Self {
        self.field(format!("{}[{}]", parent, key), value)
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service requests
// ─────────────────────────────────────────────────────────────────────────────

/// Request to register a transfer recipient together with its bank account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecipientRequest {
    pub email: String,
    /// Name on the bank account
    pub account_name: String,
    pub bsb: String,
    pub number: String,
    /// Optional name the recipient is referenced by
    #[serde(default)]
    pub name: Option<String>,
    /// Environment to register in; the default when absent
    #[serde(default)]
    pub environment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_account_numeric_bsb() {
        let json = serde_json::json!({
            "token": "ba_1",
            "name": "Mr Roland Robot",
            "bsb": 123456,
            "number": "987654321",
            "bank_name": "Bank of Tests",
        });
        let account: BankAccountResponse = serde_json::from_value(json).unwrap();
        assert_eq!(account.bsb, "123456");
        assert_eq!(account.branch, None);
    }

    #[test]
    fn test_bank_account_keeps_leading_zero() {
        let json = serde_json::json!({
            "token": "ba_1",
            "name": "Mr Roland Robot",
            "bsb": "012003",
            "number": "987654321",
            "bank_name": "ANZ",
            "branch": "Melbourne",
        });
        let account: BankAccountResponse = serde_json::from_value(json).unwrap();
        assert_eq!(account.bsb, "012003");
    }

    #[test]
    fn test_form_payload_nested_keys() {
        let form = FormPayload::new()
            .field("email", "roland@pinpayments.com")
            .nested("bank_account", "bsb", "123456");
        assert_eq!(form.get("bank_account[bsb]"), Some("123456"));
        assert_eq!(form.pairs().len(), 2);
        assert_eq!(form.pairs()[0].0, "email");
    }

    #[test]
    fn test_card_missing_scheme_fails() {
        let json = serde_json::json!({ "display_number": "XXXX-XXXX-XXXX-0000" });
        assert!(serde_json::from_value::<CardResponse>(json).is_err());
    }
}
