//! Database row types and their conversion into domain records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use pinpay_types::{
    BankAccount, BankAccountId, CardDetails, CardSummary, CardType, CurrencyCode, CustomerToken,
    CustomerTokenId, PinRecipient, PinTransaction, PinTransfer, RecipientId, RepoError,
    TransactionId, TransferId, UserId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Customer token row.
#[derive(FromRow)]
pub struct DbCustomerToken {
    pub id: i64,
    pub user_id: i64,
    pub environment: String,
    pub token: String,
    pub created: String,
    pub active: bool,
    pub card_type: Option<String>,
    pub card_number: Option<String>,
    pub card_name: Option<String>,
}

/// Transaction row. Decimals are stored as text to keep their scale.
#[derive(FromRow)]
pub struct DbTransaction {
    pub id: i64,
    pub date: String,
    pub environment: String,
    pub amount: String,
    pub fees: String,
    pub description: Option<String>,
    pub processed: bool,
    pub succeeded: bool,
    pub currency: String,
    pub transaction_token: Option<String>,
    pub card_token: Option<String>,
    pub customer_token_id: Option<i64>,
    pub pin_response: Option<String>,
    pub ip_address: String,
    pub email_address: String,
    pub card_address1: Option<String>,
    pub card_address2: Option<String>,
    pub card_city: Option<String>,
    pub card_state: Option<String>,
    pub card_postcode: Option<String>,
    pub card_country: Option<String>,
    pub card_number: Option<String>,
    pub card_type: Option<String>,
    pub pin_response_text: Option<String>,
}

/// Bank account row.
#[derive(FromRow)]
pub struct DbBankAccount {
    pub id: i64,
    pub token: String,
    pub bank_name: String,
    pub branch: String,
    pub name: String,
    pub bsb: String,
    pub number: String,
    pub environment: String,
}

/// Recipient row.
#[derive(FromRow)]
pub struct DbRecipient {
    pub id: i64,
    pub token: String,
    pub email: String,
    pub name: Option<String>,
    pub created: String,
    pub bank_account_id: Option<i64>,
    pub environment: String,
}

/// Transfer row.
#[derive(FromRow)]
pub struct DbTransfer {
    pub id: i64,
    pub transfer_token: Option<String>,
    pub status: Option<String>,
    pub currency: String,
    pub description: Option<String>,
    pub amount: i64,
    pub recipient_id: Option<i64>,
    pub created: String,
    pub pin_response_text: Option<String>,
    pub environment: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Column lists (kept next to the row structs they must match)
// ─────────────────────────────────────────────────────────────────────────────

pub const CUSTOMER_TOKEN_COLUMNS: &str =
    "id, user_id, environment, token, created, active, card_type, card_number, card_name";

pub const TRANSACTION_COLUMNS: &str = "id, date, environment, amount, fees, description, \
     processed, succeeded, currency, transaction_token, card_token, customer_token_id, \
     pin_response, ip_address, email_address, card_address1, card_address2, card_city, \
     card_state, card_postcode, card_country, card_number, card_type, pin_response_text";

pub const BANK_ACCOUNT_COLUMNS: &str =
    "id, token, bank_name, branch, name, bsb, number, environment";

pub const RECIPIENT_COLUMNS: &str =
    "id, token, email, name, created, bank_account_id, environment";

pub const TRANSFER_COLUMNS: &str = "id, transfer_token, status, currency, description, amount, \
     recipient_id, created, pin_response_text, environment";

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_time(s: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Database(format!("Invalid timestamp '{}': {}", s, e)))
}

pub fn parse_decimal(s: &str) -> Result<Decimal, RepoError> {
    s.parse()
        .map_err(|e| RepoError::Database(format!("Invalid decimal '{}': {}", s, e)))
}

pub fn parse_currency(s: &str) -> Result<CurrencyCode, RepoError> {
    s.parse()
        .map_err(|e: pinpay_types::CurrencyError| RepoError::Database(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbCustomerToken {
    pub fn into_domain(self) -> Result<CustomerToken, RepoError> {
        Ok(CustomerToken {
            id: CustomerTokenId::new(self.id),
            user_id: UserId::new(self.user_id),
            environment: self.environment,
            token: self.token,
            created: parse_time(&self.created)?,
            active: self.active,
            card: CardSummary {
                card_type: self.card_type.map(CardType::from),
                card_number: self.card_number,
                card_name: self.card_name,
            },
        })
    }
}

impl DbTransaction {
    pub fn into_domain(self) -> Result<PinTransaction, RepoError> {
        let ip_address = self
            .ip_address
            .parse()
            .map_err(|e| RepoError::Database(format!("Invalid IP '{}': {}", self.ip_address, e)))?;

        Ok(PinTransaction {
            id: TransactionId::new(self.id),
            date: parse_time(&self.date)?,
            environment: self.environment,
            amount: parse_decimal(&self.amount)?,
            fees: parse_decimal(&self.fees)?,
            description: self.description,
            processed: self.processed,
            succeeded: self.succeeded,
            currency: parse_currency(&self.currency)?,
            transaction_token: self.transaction_token,
            card_token: self.card_token,
            customer_token: self.customer_token_id.map(CustomerTokenId::new),
            pin_response: self.pin_response,
            ip_address,
            email_address: self.email_address,
            card: CardDetails {
                address1: self.card_address1,
                address2: self.card_address2,
                city: self.card_city,
                state: self.card_state,
                postcode: self.card_postcode,
                country: self.card_country,
                number: self.card_number,
                card_type: self.card_type.map(CardType::from),
            },
            pin_response_text: self.pin_response_text,
        })
    }
}

impl DbBankAccount {
    pub fn into_domain(self) -> BankAccount {
        BankAccount {
            id: BankAccountId::new(self.id),
            token: self.token,
            bank_name: self.bank_name,
            branch: self.branch,
            name: self.name,
            bsb: self.bsb,
            number: self.number,
            environment: self.environment,
        }
    }
}

impl DbRecipient {
    pub fn into_domain(self) -> Result<PinRecipient, RepoError> {
        Ok(PinRecipient {
            id: RecipientId::new(self.id),
            token: self.token,
            email: self.email,
            name: self.name,
            created: parse_time(&self.created)?,
            bank_account: self.bank_account_id.map(BankAccountId::new),
            environment: self.environment,
        })
    }
}

impl DbTransfer {
    pub fn into_domain(self) -> Result<PinTransfer, RepoError> {
        Ok(PinTransfer {
            id: TransferId::new(self.id),
            transfer_token: self.transfer_token,
            status: self.status,
            currency: parse_currency(&self.currency)?,
            description: self.description,
            amount: self.amount,
            recipient: self.recipient_id.map(RecipientId::new),
            created: parse_time(&self.created)?,
            pin_response_text: self.pin_response_text,
            environment: self.environment,
        })
    }
}
