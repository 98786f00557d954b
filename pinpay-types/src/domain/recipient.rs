//! Transfer recipients and the bank accounts they are paid into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BankAccountId, RecipientId};
use crate::dto::{BankAccountResponse, RecipientResponse};

/// A bank account as registered with the gateway. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub token: String,
    pub bank_name: String,
    pub branch: String,
    /// Name on the account
    pub name: String,
    /// Bank State Branch routing code
    pub bsb: String,
    pub number: String,
    pub environment: String,
}

impl std::fmt::Display for BankAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBankAccount {
    pub token: String,
    pub bank_name: String,
    pub branch: String,
    pub name: String,
    pub bsb: String,
    pub number: String,
    pub environment: String,
}

impl NewBankAccount {
    pub fn from_response(data: &BankAccountResponse, environment: &str) -> Self {
        Self {
            token: data.token.clone(),
            bank_name: data.bank_name.clone(),
            branch: data.branch.clone().unwrap_or_default(),
            name: data.name.clone(),
            bsb: data.bsb.clone(),
            number: data.number.clone(),
            environment: environment.to_string(),
        }
    }
}

/// Someone funds can be transferred to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinRecipient {
    pub id: RecipientId,
    pub token: String,
    pub email: String,
    pub name: Option<String>,
    pub created: DateTime<Utc>,
    /// Cleared if the bank account row is removed
    pub bank_account: Option<BankAccountId>,
    pub environment: String,
}

impl std::fmt::Display for PinRecipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}

/// A recipient about to be inserted; its bank account id is assigned by the
/// store when both rows are written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipient {
    pub token: String,
    pub email: String,
    pub name: Option<String>,
    pub environment: String,
}

impl NewRecipient {
    pub fn from_response(data: &RecipientResponse, environment: &str) -> Self {
        Self {
            token: data.token.clone(),
            email: data.email.clone(),
            name: data.name.clone().filter(|n| !n.is_empty()),
            environment: environment.to_string(),
        }
    }
}
