//! SQLite repository adapter.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use pinpay_types::{
    BankAccount, BankAccountId, CardType, CustomerToken, CustomerTokenId, NewBankAccount,
    NewCustomerToken, NewPinTransfer, NewRecipient, PinRecipient, PinRepository, PinTransaction,
    PinTransfer, RecipientId, RepoError, TransactionId, TransferId, UserId, ValidatedTransaction,
};

use crate::types::{
    BANK_ACCOUNT_COLUMNS, CUSTOMER_TOKEN_COLUMNS, DbBankAccount, DbCustomerToken, DbRecipient,
    DbTransaction, DbTransfer, RECIPIENT_COLUMNS, TRANSACTION_COLUMNS, TRANSFER_COLUMNS,
};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

fn tx_err(e: sqlx::Error) -> RepoError {
    RepoError::Transaction(e.to_string())
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &SqlitePool, sql: &str, name: &str) -> anyhow::Result<()> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own database, so
        // keep exactly one alive for the pool's lifetime.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        execute_migration(
            &pool,
            include_str!("../migrations/0001_create_tables.sql"),
            "0001",
        )
        .await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PinRepository for SqliteRepo {
    async fn insert_customer_token(
        &self,
        new: NewCustomerToken,
    ) -> Result<CustomerToken, RepoError> {
        let created = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO customer_tokens (user_id, environment, token, created, active, card_type, card_number, card_name)
               VALUES (?, ?, ?, ?, 1, ?, ?, ?)"#,
        )
        .bind(new.user_id.get())
        .bind(&new.environment)
        .bind(&new.token)
        .bind(created.to_rfc3339())
        .bind(new.card.card_type.as_ref().map(CardType::as_str))
        .bind(&new.card.card_number)
        .bind(&new.card.card_name)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = CustomerTokenId::new(result.last_insert_rowid());
        debug!(%id, token = %new.token, "Inserted customer token");

        Ok(CustomerToken {
            id,
            user_id: new.user_id,
            environment: new.environment,
            token: new.token,
            created,
            active: true,
            card: new.card,
        })
    }

    async fn get_customer_token(
        &self,
        id: CustomerTokenId,
    ) -> Result<Option<CustomerToken>, RepoError> {
        let sql = format!(
            "SELECT {} FROM customer_tokens WHERE id = ?",
            CUSTOMER_TOKEN_COLUMNS
        );
        let row: Option<DbCustomerToken> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(DbCustomerToken::into_domain).transpose()
    }

    async fn update_customer_token(&self, customer: &CustomerToken) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE customer_tokens
               SET active = ?, card_type = ?, card_number = ?, card_name = ?
               WHERE id = ?"#,
        )
        .bind(customer.active)
        .bind(customer.card.card_type.as_ref().map(CardType::as_str))
        .bind(&customer.card.card_number)
        .bind(&customer.card.card_name)
        .bind(customer.id.get())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list_customer_tokens_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CustomerToken>, RepoError> {
        let sql = format!(
            "SELECT {} FROM customer_tokens WHERE user_id = ? ORDER BY created DESC, id DESC",
            CUSTOMER_TOKEN_COLUMNS
        );
        let rows: Vec<DbCustomerToken> = sqlx::query_as(&sql)
            .bind(user_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(DbCustomerToken::into_domain).collect()
    }

    async fn delete_customer_token(&self, id: CustomerTokenId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM customer_tokens WHERE id = ?"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_transaction(
        &self,
        tx: ValidatedTransaction,
    ) -> Result<PinTransaction, RepoError> {
        let draft = tx.draft();

        let result = sqlx::query(
            r#"INSERT INTO pin_transactions (date, environment, amount, fees, description, processed, succeeded, currency, card_token, customer_token_id, ip_address, email_address)
               VALUES (?, ?, ?, '0.00', ?, 0, 0, ?, ?, ?, ?, ?)"#,
        )
        .bind(tx.date().to_rfc3339())
        .bind(&draft.environment)
        .bind(draft.amount.to_string())
        .bind(&draft.description)
        .bind(draft.currency.code())
        .bind(&draft.card_token)
        .bind(draft.customer_token.map(|c| c.get()))
        .bind(draft.ip_address.to_string())
        .bind(&draft.email_address)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = TransactionId::new(result.last_insert_rowid());
        debug!(%id, "Inserted transaction");

        Ok(tx.into_transaction(id))
    }

    async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<PinTransaction>, RepoError> {
        let sql = format!(
            "SELECT {} FROM pin_transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        );
        let row: Option<DbTransaction> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn claim_transaction(&self, id: TransactionId) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE pin_transactions SET processed = 1 WHERE id = ? AND processed = 0"#,
        )
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_charge_result(&self, tx: &PinTransaction) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE pin_transactions
               SET processed = ?, succeeded = ?, fees = ?, transaction_token = ?, pin_response = ?,
                   card_address1 = ?, card_address2 = ?, card_city = ?, card_state = ?,
                   card_postcode = ?, card_country = ?, card_number = ?, card_type = ?,
                   pin_response_text = ?
               WHERE id = ?"#,
        )
        .bind(tx.processed)
        .bind(tx.succeeded)
        .bind(tx.fees.to_string())
        .bind(&tx.transaction_token)
        .bind(&tx.pin_response)
        .bind(&tx.card.address1)
        .bind(&tx.card.address2)
        .bind(&tx.card.city)
        .bind(&tx.card.state)
        .bind(&tx.card.postcode)
        .bind(&tx.card.country)
        .bind(&tx.card.number)
        .bind(tx.card.card_type.as_ref().map(CardType::as_str))
        .bind(&tx.pin_response_text)
        .bind(tx.id.get())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list_transactions(&self) -> Result<Vec<PinTransaction>, RepoError> {
        let sql = format!(
            "SELECT {} FROM pin_transactions ORDER BY date DESC, id DESC",
            TRANSACTION_COLUMNS
        );
        let rows: Vec<DbTransaction> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn list_in_flight_transactions(&self) -> Result<Vec<PinTransaction>, RepoError> {
        let sql = format!(
            "SELECT {} FROM pin_transactions
             WHERE processed = 1 AND succeeded = 0 AND pin_response IS NULL
             ORDER BY date DESC, id DESC",
            TRANSACTION_COLUMNS
        );
        let rows: Vec<DbTransaction> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn insert_recipient_with_bank_account(
        &self,
        account: NewBankAccount,
        recipient: NewRecipient,
    ) -> Result<(BankAccount, PinRecipient), RepoError> {
        let mut db_tx = self.pool.begin().await.map_err(tx_err)?;

        let account_id = sqlx::query(
            r#"INSERT INTO bank_accounts (token, bank_name, branch, name, bsb, number, environment)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&account.token)
        .bind(&account.bank_name)
        .bind(&account.branch)
        .bind(&account.name)
        .bind(&account.bsb)
        .bind(&account.number)
        .bind(&account.environment)
        .execute(&mut *db_tx)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        let created = Utc::now();

        let recipient_id = sqlx::query(
            r#"INSERT INTO pin_recipients (token, email, name, created, bank_account_id, environment)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&recipient.token)
        .bind(&recipient.email)
        .bind(&recipient.name)
        .bind(created.to_rfc3339())
        .bind(account_id)
        .bind(&recipient.environment)
        .execute(&mut *db_tx)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        db_tx.commit().await.map_err(tx_err)?;

        let account_id = BankAccountId::new(account_id);
        debug!(%account_id, recipient_id, "Inserted recipient with bank account");

        Ok((
            BankAccount {
                id: account_id,
                token: account.token,
                bank_name: account.bank_name,
                branch: account.branch,
                name: account.name,
                bsb: account.bsb,
                number: account.number,
                environment: account.environment,
            },
            PinRecipient {
                id: RecipientId::new(recipient_id),
                token: recipient.token,
                email: recipient.email,
                name: recipient.name,
                created,
                bank_account: Some(account_id),
                environment: recipient.environment,
            },
        ))
    }

    async fn get_bank_account(&self, id: BankAccountId) -> Result<Option<BankAccount>, RepoError> {
        let sql = format!(
            "SELECT {} FROM bank_accounts WHERE id = ?",
            BANK_ACCOUNT_COLUMNS
        );
        let row: Option<DbBankAccount> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(DbBankAccount::into_domain))
    }

    async fn delete_bank_account(&self, id: BankAccountId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM bank_accounts WHERE id = ?"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_recipient(&self, id: RecipientId) -> Result<Option<PinRecipient>, RepoError> {
        let sql = format!(
            "SELECT {} FROM pin_recipients WHERE id = ?",
            RECIPIENT_COLUMNS
        );
        let row: Option<DbRecipient> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(DbRecipient::into_domain).transpose()
    }

    async fn delete_recipient(&self, id: RecipientId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM pin_recipients WHERE id = ?"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_transfer(&self, new: NewPinTransfer) -> Result<PinTransfer, RepoError> {
        let created = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO pin_transfers (transfer_token, status, currency, description, amount, recipient_id, created, pin_response_text, environment)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&new.transfer_token)
        .bind(&new.status)
        .bind(new.currency.code())
        .bind(&new.description)
        .bind(new.amount)
        .bind(new.recipient.get())
        .bind(created.to_rfc3339())
        .bind(&new.pin_response_text)
        .bind(&new.environment)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = TransferId::new(result.last_insert_rowid());
        debug!(%id, token = %new.transfer_token, "Inserted transfer");

        Ok(PinTransfer {
            id,
            transfer_token: Some(new.transfer_token),
            status: Some(new.status),
            currency: new.currency,
            description: new.description,
            amount: new.amount,
            recipient: Some(new.recipient),
            created,
            pin_response_text: Some(new.pin_response_text),
            environment: new.environment,
        })
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Option<PinTransfer>, RepoError> {
        let sql = format!("SELECT {} FROM pin_transfers WHERE id = ?", TRANSFER_COLUMNS);
        let row: Option<DbTransfer> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(DbTransfer::into_domain).transpose()
    }

    async fn list_transfers_for_recipient(
        &self,
        recipient: RecipientId,
    ) -> Result<Vec<PinTransfer>, RepoError> {
        let sql = format!(
            "SELECT {} FROM pin_transfers WHERE recipient_id = ? ORDER BY created DESC, id DESC",
            TRANSFER_COLUMNS
        );
        let rows: Vec<DbTransfer> = sqlx::query_as(&sql)
            .bind(recipient.get())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(DbTransfer::into_domain).collect()
    }
}
