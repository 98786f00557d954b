//! Pin Application Service
//!
//! Orchestrates gateway calls and persistence through the two ports.
//! Contains NO infrastructure logic - HTTP and SQL live in the adapters.

use tracing::{debug, error, info, instrument, warn};

use pinpay_types::{
    BankAccount, BankAccountId, ChargeOutcome, CreateRecipientRequest, CurrencyCode,
    CustomerResponse, CustomerToken, CustomerTokenId, EnvironmentResolver, FormPayload, Gateway,
    GatewayResponse, NewBankAccount, NewCustomerToken, NewPinTransaction, NewPinTransfer,
    NewRecipient, PinError, PinRecipient, PinRepository, PinTransaction, PinTransfer,
    RecipientId, RecipientResponse, TransactionId, TransferId, TransferResponse, User, UserId,
};

/// Application service for Pin operations.
///
/// Generic over `R: PinRepository` and `G: Gateway` - both adapters are
/// injected at compile time. Each operation performs at most one gateway
/// round-trip and never retries.
pub struct PinService<R: PinRepository, G: Gateway> {
    repo: R,
    gateway: G,
    environments: EnvironmentResolver,
}

impl<R: PinRepository, G: Gateway> PinService<R, G> {
    pub fn new(repo: R, gateway: G, environments: EnvironmentResolver) -> Self {
        Self {
            repo,
            gateway,
            environments,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn environments(&self) -> &EnvironmentResolver {
        &self.environments
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transactions
    // ─────────────────────────────────────────────────────────────────────────────

    /// Validates and stores a new, unprocessed transaction.
    ///
    /// A linked customer token must exist locally.
    #[instrument(skip(self, req), fields(amount = %req.amount, currency = %req.currency))]
    pub async fn create_transaction(
        &self,
        req: NewPinTransaction,
    ) -> Result<PinTransaction, PinError> {
        let validated = req.validate(&self.environments)?;

        if let Some(customer_id) = validated.draft().customer_token {
            self.get_customer(customer_id).await?;
        }

        let tx = self.repo.insert_transaction(validated).await?;
        info!(transaction_id = %tx.id, environment = %tx.environment, "Transaction created");
        Ok(tx)
    }

    /// Submits the charge for an unprocessed transaction.
    ///
    /// Returns `Ok(None)` when the transaction was already processed (or a
    /// concurrent caller claimed it first); nothing is sent in that case.
    /// Otherwise returns the status message that was stored.
    ///
    /// Gateway declines and unparseable answers are recorded and reported
    /// through the returned message, not as errors. Transport failures
    /// propagate and leave the record in flight.
    #[instrument(skip(self), fields(transaction_id = %id))]
    pub async fn process_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<String>, PinError> {
        let mut tx = self.get_transaction(id).await?;
        if tx.processed {
            debug!("Transaction already processed");
            return Ok(None);
        }

        let env = self.environments.resolve(&tx.environment)?;
        let customer_token = match (&tx.card_token, tx.customer_token) {
            (Some(_), _) => None,
            (None, Some(customer_id)) => Some(self.get_customer(customer_id).await?.token),
            (None, None) => None,
        };
        let form = tx.charge_payload(customer_token.as_deref())?;

        if !self.repo.claim_transaction(id).await? {
            info!("Transaction claimed by another caller");
            return Ok(None);
        }
        tx.processed = true;

        let response = self
            .gateway
            .post(&env, "/charges", &form, true)
            .await
            .inspect_err(|e| error!(error = %e, "Charge request failed, transaction left in flight"))?;

        tx.pin_response_text = Some(response.body.clone());

        let outcome = match ChargeOutcome::interpret(response.json.as_ref()) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, status = response.status, "Charge response unusable");
                self.repo.record_charge_result(&tx).await?;
                return Err(e);
            }
        };

        let message = tx.apply_outcome(outcome);
        if tx.succeeded {
            info!(
                token = tx.transaction_token.as_deref().unwrap_or_default(),
                fees = %tx.fees,
                "Charge succeeded"
            );
        } else {
            warn!(status = response.status, %message, "Charge failed");
        }

        self.repo.record_charge_result(&tx).await?;
        Ok(Some(message))
    }

    /// Gets a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<PinTransaction, PinError> {
        self.repo
            .get_transaction(id)
            .await?
            .ok_or_else(|| PinError::NotFound(format!("Transaction {}", id)))
    }

    /// Lists all transactions, newest first.
    pub async fn list_transactions(&self) -> Result<Vec<PinTransaction>, PinError> {
        Ok(self.repo.list_transactions().await?)
    }

    /// Transactions that were submitted but have no recorded outcome.
    pub async fn list_in_flight_transactions(&self) -> Result<Vec<PinTransaction>, PinError> {
        Ok(self.repo.list_in_flight_transactions().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Exchanges a one-time card token for a reusable customer token.
    #[instrument(skip(self, card_token, user), fields(user_id = %user.id))]
    pub async fn create_customer_from_card_token(
        &self,
        card_token: &str,
        user: &User,
        environment: Option<&str>,
    ) -> Result<CustomerToken, PinError> {
        if card_token.trim().is_empty() {
            return Err(PinError::Validation("Card token is required".into()));
        }
        let env = self.environments.resolve(environment.unwrap_or_default())?;

        let form = FormPayload::new()
            .field("email", &user.email)
            .field("card_token", card_token);

        let data: CustomerResponse = self
            .gateway
            .post(&env, "/customers", &form, false)
            .await?
            .into_data()?;

        let customer = self
            .repo
            .insert_customer_token(NewCustomerToken::from_response(user, env.name, &data))
            .await?;
        info!(customer_id = %customer.id, token = %customer.token, "Customer created");
        Ok(customer)
    }

    /// Replaces the card behind an existing customer token.
    #[instrument(skip(self, card_token), fields(customer_id = %id))]
    pub async fn update_customer_card(
        &self,
        id: CustomerTokenId,
        card_token: &str,
    ) -> Result<CustomerToken, PinError> {
        if card_token.trim().is_empty() {
            return Err(PinError::Validation("Card token is required".into()));
        }
        let mut customer = self.get_customer(id).await?;
        let env = self.environments.resolve(&customer.environment)?;

        let form = FormPayload::new().field("card_token", card_token);
        let data: CustomerResponse = self
            .gateway
            .put(&env, &format!("/customers/{}", customer.token), &form)
            .await?
            .into_data()?;

        customer.apply_card(&data.card);
        self.repo.update_customer_token(&customer).await?;
        info!(token = %customer.token, "Customer card updated");
        Ok(customer)
    }

    /// Marks a customer token active or inactive. Local only.
    pub async fn set_customer_active(
        &self,
        id: CustomerTokenId,
        active: bool,
    ) -> Result<CustomerToken, PinError> {
        let mut customer = self.get_customer(id).await?;
        customer.active = active;
        self.repo.update_customer_token(&customer).await?;
        Ok(customer)
    }

    pub async fn get_customer(&self, id: CustomerTokenId) -> Result<CustomerToken, PinError> {
        self.repo
            .get_customer_token(id)
            .await?
            .ok_or_else(|| PinError::NotFound(format!("Customer token {}", id)))
    }

    pub async fn list_customers_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CustomerToken>, PinError> {
        Ok(self.repo.list_customer_tokens_for_user(user_id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Recipients & Transfers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Registers a transfer recipient and its bank account with the gateway,
    /// then stores both locally.
    #[instrument(skip(self, req), fields(environment = req.environment.as_deref().unwrap_or_default()))]
    pub async fn create_recipient_with_bank_account(
        &self,
        req: CreateRecipientRequest,
    ) -> Result<(BankAccount, PinRecipient), PinError> {
        for (field, value) in [
            ("email", &req.email),
            ("account_name", &req.account_name),
            ("bsb", &req.bsb),
            ("number", &req.number),
        ] {
            if value.trim().is_empty() {
                return Err(PinError::Validation(format!("{} is required", field)));
            }
        }
        let env = self
            .environments
            .resolve(req.environment.as_deref().unwrap_or_default())?;

        let form = FormPayload::new()
            .field("email", &req.email)
            .field("name", req.name.as_deref().unwrap_or_default())
            .nested("bank_account", "name", &req.account_name)
            .nested("bank_account", "bsb", &req.bsb)
            .nested("bank_account", "number", &req.number);

        let data: RecipientResponse = self
            .gateway
            .post(&env, "/recipients", &form, false)
            .await?
            .into_data()?;

        let account = NewBankAccount::from_response(&data.bank_account, &env.name);
        let recipient = NewRecipient::from_response(&data, &env.name);
        let (account, recipient) = self
            .repo
            .insert_recipient_with_bank_account(account, recipient)
            .await?;

        info!(
            recipient_id = %recipient.id,
            bank_account_id = %account.id,
            token = %recipient.token,
            "Recipient created"
        );
        Ok((account, recipient))
    }

    /// Pays `amount` (minor units) out to a recipient's bank account.
    ///
    /// The transfer is sent in the recipient's environment.
    #[instrument(skip(self, description), fields(currency = %currency))]
    pub async fn send_transfer(
        &self,
        amount: i64,
        description: &str,
        recipient_id: RecipientId,
        currency: CurrencyCode,
    ) -> Result<PinTransfer, PinError> {
        if amount <= 0 {
            return Err(PinError::Validation("Amount must be positive".into()));
        }
        let recipient = self.get_recipient(recipient_id).await?;
        let env = self.environments.resolve(&recipient.environment)?;

        let form = FormPayload::new()
            .field("amount", amount)
            .field("description", description)
            .field("recipient", &recipient.token)
            .field("currency", currency);

        let response: GatewayResponse = self.gateway.post(&env, "/transfers", &form, false).await?;
        let raw_body = response.body.clone();
        let data: TransferResponse = response.into_data()?;

        let transfer = self
            .repo
            .insert_transfer(NewPinTransfer::from_response(
                data,
                recipient.id,
                &env.name,
                raw_body,
            )?)
            .await?;
        info!(
            transfer_id = %transfer.id,
            status = transfer.status.as_deref().unwrap_or_default(),
            "Transfer sent"
        );
        Ok(transfer)
    }

    pub async fn get_recipient(&self, id: RecipientId) -> Result<PinRecipient, PinError> {
        self.repo
            .get_recipient(id)
            .await?
            .ok_or_else(|| PinError::NotFound(format!("Recipient {}", id)))
    }

    pub async fn get_bank_account(&self, id: BankAccountId) -> Result<BankAccount, PinError> {
        self.repo
            .get_bank_account(id)
            .await?
            .ok_or_else(|| PinError::NotFound(format!("Bank account {}", id)))
    }

    pub async fn get_transfer(&self, id: TransferId) -> Result<PinTransfer, PinError> {
        self.repo
            .get_transfer(id)
            .await?
            .ok_or_else(|| PinError::NotFound(format!("Transfer {}", id)))
    }

    pub async fn list_transfers_for_recipient(
        &self,
        recipient_id: RecipientId,
    ) -> Result<Vec<PinTransfer>, PinError> {
        Ok(self.repo.list_transfers_for_recipient(recipient_id).await?)
    }
}
