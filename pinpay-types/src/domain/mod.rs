//! Domain models for the Pin Payments integration.

pub mod charge;
pub mod customer;
pub mod ids;
pub mod recipient;
pub mod transaction;
pub mod transfer;

pub use charge::{ChargeOutcome, error_message};
pub use customer::{CardSummary, CardType, CustomerToken, NewCustomerToken, User};
pub use ids::{BankAccountId, CustomerTokenId, RecipientId, TransactionId, TransferId, UserId};
pub use recipient::{BankAccount, NewBankAccount, NewRecipient, PinRecipient};
pub use transaction::{
    CardDetails, NewPinTransaction, PinTransaction, TransactionState, ValidatedTransaction,
};
pub use transfer::{NewPinTransfer, PinTransfer};
