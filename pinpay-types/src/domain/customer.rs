//! Customer tokens: reusable card references tied to a local user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CustomerTokenId, UserId};
use crate::dto::{CardResponse, CustomerResponse};

/// Card scheme as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardType {
    Master,
    Visa,
    /// Any other scheme string the gateway reports
    Other(String),
}

impl From<String> for CardType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "master" => CardType::Master,
            "visa" => CardType::Visa,
            _ => CardType::Other(s),
        }
    }
}

impl CardType {
    /// The scheme string as the gateway spells it.
    pub fn as_str(&self) -> &str {
        match self {
            CardType::Master => "master",
            CardType::Visa => "visa",
            CardType::Other(s) => s,
        }
    }
}

impl From<CardType> for String {
    fn from(card_type: CardType) -> Self {
        card_type.as_str().to_string()
    }
}

impl AsRef<str> for CardType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardType::Master => write!(f, "Mastercard"),
            CardType::Visa => write!(f, "Visa"),
            CardType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A local user as far as the gateway is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

/// Last-known card metadata for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub card_type: Option<CardType>,
    /// Masked by the gateway
    pub card_number: Option<String>,
    pub card_name: Option<String>,
}

impl From<&CardResponse> for CardSummary {
    fn from(card: &CardResponse) -> Self {
        Self {
            card_type: Some(CardType::from(card.scheme.clone())),
            card_number: Some(card.display_number.clone()),
            card_name: card.name.clone(),
        }
    }
}

/// A reusable token issued by the Customers API.
///
/// Unlike a card token, which can be used once, a customer token may be
/// charged repeatedly, which makes it the basis for recurring billing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerToken {
    pub id: CustomerTokenId,
    pub user_id: UserId,
    /// Gateway environment this token belongs to
    pub environment: String,
    pub token: String,
    pub created: DateTime<Utc>,
    pub active: bool,
    pub card: CardSummary,
}

impl CustomerToken {
    /// Overwrites the stored card metadata with a fresh gateway response.
    pub fn apply_card(&mut self, card: &CardResponse) {
        self.card = CardSummary::from(card);
    }
}

impl std::fmt::Display for CustomerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}

/// A customer token about to be inserted.
#[derive(Debug, Clone)]
pub struct NewCustomerToken {
    pub user_id: UserId,
    pub environment: String,
    pub token: String,
    pub card: CardSummary,
}

impl NewCustomerToken {
    pub fn from_response(user: &User, environment: String, data: &CustomerResponse) -> Self {
        Self {
            user_id: user.id,
            environment,
            token: data.token.clone(),
            card: CardSummary::from(&data.card),
        }
    }
}
