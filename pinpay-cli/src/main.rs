//! Pinpay CLI
//!
//! Command-line interface for charging cards, managing customer tokens and
//! paying out to recipients through Pin Payments. Records are kept in the
//! configured SQLite database; every command prints JSON.

mod config;

use std::net::IpAddr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pinpay_client::PinClient;
use pinpay_hex::PinService;
use pinpay_repo::{SqliteRepo, build_repo};
use pinpay_types::{
    CreateRecipientRequest, CurrencyCode, CustomerTokenId, EnvironmentResolver, NewPinTransaction,
    PinError, RecipientId, TransactionId, TransferId, User, UserId,
};

type Service = PinService<SqliteRepo, PinClient>;

#[derive(Parser)]
#[command(name = "pinpay")]
#[command(author, version, about = "Pin Payments CLI", long_about = None)]
struct Cli {
    /// Database URL, e.g. sqlite://pinpay.db?mode=rwc
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Customer token operations
    Customer {
        #[command(subcommand)]
        action: CustomerCommands,
    },
    /// Charge operations
    Charge {
        #[command(subcommand)]
        action: ChargeCommands,
    },
    /// Transfer recipient operations
    Recipient {
        #[command(subcommand)]
        action: RecipientCommands,
    },
    /// Transfer operations
    Transfer {
        #[command(subcommand)]
        action: TransferCommands,
    },
    /// Convert an amount in minor units to major units
    Value {
        amount: i64,
        #[arg(default_value = "AUD")]
        currency: CurrencyCode,
    },
}

#[derive(Subcommand)]
enum CustomerCommands {
    /// Exchange a card token for a reusable customer token
    Create {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        email: String,
        #[arg(long)]
        card_token: String,
        #[arg(long)]
        environment: Option<String>,
    },
    /// Replace the card behind a customer token
    UpdateCard {
        id: CustomerTokenId,
        #[arg(long)]
        card_token: String,
    },
    /// Mark a customer token active or inactive
    SetActive {
        id: CustomerTokenId,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Show a customer token
    Show { id: CustomerTokenId },
    /// List a user's customer tokens
    List {
        #[arg(long)]
        user_id: UserId,
    },
}

#[derive(Subcommand)]
enum ChargeCommands {
    /// Record a new, unprocessed charge
    Create {
        /// Amount in major units, e.g. 10.00
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "AUD")]
        currency: CurrencyCode,
        #[arg(long)]
        email: String,
        #[arg(long)]
        ip_address: IpAddr,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "customer_id")]
        card_token: Option<String>,
        #[arg(long)]
        customer_id: Option<CustomerTokenId>,
        #[arg(long, default_value = "")]
        environment: String,
    },
    /// Submit a recorded charge to the gateway
    Process { id: TransactionId },
    /// Show a charge
    Show { id: TransactionId },
    /// List all charges, newest first
    List,
    /// List charges that were submitted but have no recorded outcome
    InFlight,
}

#[derive(Subcommand)]
enum RecipientCommands {
    /// Register a recipient and its bank account
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        account_name: String,
        #[arg(long)]
        bsb: String,
        #[arg(long)]
        number: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        environment: Option<String>,
    },
    /// Show a recipient and its bank account
    Show { id: RecipientId },
}

#[derive(Subcommand)]
enum TransferCommands {
    /// Pay out to a recipient
    Send {
        #[arg(long)]
        recipient: RecipientId,
        /// Amount in minor units, e.g. 400 for $4.00
        #[arg(long)]
        amount: i64,
        #[arg(long, default_value = "AUD")]
        currency: CurrencyCode,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Show a transfer
    Show { id: TransferId },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,pinpay_hex=debug,pinpay_client=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn build_service(database_url: Option<String>) -> Result<Service> {
    let database_url = database_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("--database-url or DATABASE_URL is required"))?;
    let config = config::Config::from_env()?;

    let environments = EnvironmentResolver::new(config.pin)?;
    tracing::info!(
        environments = %environments.names().collect::<Vec<_>>().join(","),
        default = environments.default_name(),
        "Pin environments configured"
    );
    tracing::info!("Using database: {}", database_url);

    let repo = build_repo(&database_url).await?;
    let client = match config.timeout {
        Some(timeout) => PinClient::with_timeout(timeout)?,
        None => PinClient::new(),
    };

    Ok(PinService::new(repo, client, environments))
}

async fn run(cli: Cli) -> Result<()> {
    // Pure conversion; needs no configuration.
    if let Commands::Value { amount, currency } = cli.command {
        return print(&json!({
            "amount": amount,
            "currency": currency,
            "value": pinpay_currency::value(amount, currency),
        }));
    }

    let service = build_service(cli.database_url).await?;

    match cli.command {
        Commands::Value { .. } => {}

        Commands::Customer { action } => match action {
            CustomerCommands::Create {
                user_id,
                email,
                card_token,
                environment,
            } => {
                let user = User { id: user_id, email };
                let customer = service
                    .create_customer_from_card_token(&card_token, &user, environment.as_deref())
                    .await?;
                print(&customer)?;
            }
            CustomerCommands::UpdateCard { id, card_token } => {
                print(&service.update_customer_card(id, &card_token).await?)?;
            }
            CustomerCommands::SetActive { id, active } => {
                print(&service.set_customer_active(id, active).await?)?;
            }
            CustomerCommands::Show { id } => {
                print(&service.get_customer(id).await?)?;
            }
            CustomerCommands::List { user_id } => {
                print(&service.list_customers_for_user(user_id).await?)?;
            }
        },

        Commands::Charge { action } => match action {
            ChargeCommands::Create {
                amount,
                currency,
                email,
                ip_address,
                description,
                card_token,
                customer_id,
                environment,
            } => {
                let tx = service
                    .create_transaction(NewPinTransaction {
                        environment,
                        amount,
                        currency,
                        description,
                        card_token,
                        customer_token: customer_id,
                        ip_address,
                        email_address: email,
                    })
                    .await?;
                print(&tx)?;
            }
            ChargeCommands::Process { id } => {
                let message = service.process_transaction(id).await?;
                let tx = service.get_transaction(id).await?;
                print(&json!({
                    "processed_now": message.is_some(),
                    "message": message,
                    "state": tx.state(),
                    "transaction": tx,
                }))?;
            }
            ChargeCommands::Show { id } => {
                let tx = service.get_transaction(id).await?;
                print(&json!({ "state": tx.state(), "transaction": tx }))?;
            }
            ChargeCommands::List => {
                print(&service.list_transactions().await?)?;
            }
            ChargeCommands::InFlight => {
                print(&service.list_in_flight_transactions().await?)?;
            }
        },

        Commands::Recipient { action } => match action {
            RecipientCommands::Create {
                email,
                account_name,
                bsb,
                number,
                name,
                environment,
            } => {
                let (account, recipient) = service
                    .create_recipient_with_bank_account(CreateRecipientRequest {
                        email,
                        account_name,
                        bsb,
                        number,
                        name,
                        environment,
                    })
                    .await?;
                print(&json!({ "recipient": recipient, "bank_account": account }))?;
            }
            RecipientCommands::Show { id } => {
                let recipient = service.get_recipient(id).await?;
                let account = match recipient.bank_account {
                    Some(account_id) => Some(service.get_bank_account(account_id).await?),
                    None => None,
                };
                print(&json!({ "recipient": recipient, "bank_account": account }))?;
            }
        },

        Commands::Transfer { action } => match action {
            TransferCommands::Send {
                recipient,
                amount,
                currency,
                description,
            } => {
                let transfer = service
                    .send_transfer(amount, &description, recipient, currency)
                    .await?;
                print(&json!({ "value": transfer.value(), "transfer": transfer }))?;
            }
            TransferCommands::Show { id } => {
                let transfer = service.get_transfer(id).await?;
                print(&json!({ "value": transfer.value(), "transfer": transfer }))?;
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "Command failed");
        eprintln!("Error: {:#}", err);
        // 2: rejected locally, nothing sent; 1: anything else
        let code = match err.downcast_ref::<PinError>() {
            Some(pin) if pin.is_local() => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_flag() {
        let cli = Cli::try_parse_from([
            "pinpay",
            "--database-url",
            "sqlite::memory:",
            "charge",
            "list",
        ])
        .unwrap();

        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
        assert!(matches!(
            cli.command,
            Commands::Charge {
                action: ChargeCommands::List
            }
        ));
    }

    #[test]
    fn test_value_parses_currency() {
        let cli = Cli::try_parse_from(["pinpay", "value", "400", "JPY"]).unwrap();

        assert!(matches!(
            cli.command,
            Commands::Value {
                amount: 400,
                currency: CurrencyCode::JPY
            }
        ));
    }

    #[tokio::test]
    async fn test_build_service_requires_database_url() {
        let err = build_service(Some("  ".into())).await.err().unwrap();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
