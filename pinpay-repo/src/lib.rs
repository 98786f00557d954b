//! # Pinpay Repository
//!
//! SQLite adapter for the [`PinRepository`](pinpay_types::PinRepository)
//! port. Customer tokens, transactions, bank accounts, recipients and
//! transfers each get a table; migrations run on connect.

#[cfg(not(feature = "sqlite"))]
compile_error!("Enable the `sqlite` feature.");

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
mod types;


#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepo;

/// Build and initialize a repository from a database URL.
///
/// This function:
/// 1. Connects to the database (creating the file if needed)
/// 2. Runs migrations to create tables
/// 3. Returns a ready-to-use repository
///
/// # Examples
///
/// ```ignore
/// let repo = build_repo("sqlite://pinpay.db?mode=rwc").await?;
/// let repo = build_repo("sqlite::memory:").await?;
/// ```
#[cfg(feature = "sqlite")]
pub async fn build_repo(database_url: &str) -> anyhow::Result<SqliteRepo> {
    SqliteRepo::new(database_url).await
}
