//! Repository port trait.
//!
//! Adapters (SQLite, in-memory) implement this trait. References between
//! rows are weak: deleting a customer token, bank account or recipient
//! clears the reference held by transactions, recipients or transfers.

use crate::domain::{
    BankAccount, BankAccountId, CustomerToken, CustomerTokenId, NewBankAccount,
    NewCustomerToken, NewPinTransfer, NewRecipient, PinRecipient, PinTransaction, PinTransfer,
    RecipientId, TransactionId, TransferId, UserId, ValidatedTransaction,
};
use crate::error::RepoError;

/// Persistence for the five record types.
#[async_trait::async_trait]
pub trait PinRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Customer tokens
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_customer_token(
        &self,
        new: NewCustomerToken,
    ) -> Result<CustomerToken, RepoError>;

    async fn get_customer_token(
        &self,
        id: CustomerTokenId,
    ) -> Result<Option<CustomerToken>, RepoError>;

    /// Persists card metadata and the active flag.
    async fn update_customer_token(&self, customer: &CustomerToken) -> Result<(), RepoError>;

    async fn list_customer_tokens_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CustomerToken>, RepoError>;

    async fn delete_customer_token(&self, id: CustomerTokenId) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Transactions
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_transaction(
        &self,
        tx: ValidatedTransaction,
    ) -> Result<PinTransaction, RepoError>;

    async fn get_transaction(&self, id: TransactionId)
    -> Result<Option<PinTransaction>, RepoError>;

    /// Atomically flips `processed` from false to true.
    ///
    /// Returns `false` if the record was already processed (or is missing),
    /// in which case the caller must not submit the charge.
    async fn claim_transaction(&self, id: TransactionId) -> Result<bool, RepoError>;

    /// Persists the outcome fields of a processed transaction.
    async fn record_charge_result(&self, tx: &PinTransaction) -> Result<(), RepoError>;

    /// All transactions, newest first.
    async fn list_transactions(&self) -> Result<Vec<PinTransaction>, RepoError>;

    /// Processed transactions with no recorded outcome.
    async fn list_in_flight_transactions(&self) -> Result<Vec<PinTransaction>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Recipients & bank accounts
    // ─────────────────────────────────────────────────────────────────────────────

    /// Writes the bank account, then the recipient referencing it, as one unit.
    async fn insert_recipient_with_bank_account(
        &self,
        account: NewBankAccount,
        recipient: NewRecipient,
    ) -> Result<(BankAccount, PinRecipient), RepoError>;

    async fn get_bank_account(&self, id: BankAccountId) -> Result<Option<BankAccount>, RepoError>;

    async fn delete_bank_account(&self, id: BankAccountId) -> Result<bool, RepoError>;

    async fn get_recipient(&self, id: RecipientId) -> Result<Option<PinRecipient>, RepoError>;

    async fn delete_recipient(&self, id: RecipientId) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Transfers
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_transfer(&self, new: NewPinTransfer) -> Result<PinTransfer, RepoError>;

    async fn get_transfer(&self, id: TransferId) -> Result<Option<PinTransfer>, RepoError>;

    async fn list_transfers_for_recipient(
        &self,
        recipient: RecipientId,
    ) -> Result<Vec<PinTransfer>, RepoError>;
}
