//! Balance storage backends.
//!
//! A [`BalanceStore`] hands out [`WalletScope`]s: exclusive, transactional
//! views of a single wallet. Everything done through a scope becomes visible
//! on [`WalletScope::commit`] and is discarded on rollback or drop. Scopes on
//! different wallets never block each other.

pub mod memory;
pub mod migrations;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::error::StoreError;
use crate::infrastructure::config::{Config, StorageBackend};

pub use memory::InMemoryBalanceStore;
pub use postgres::PostgresBalanceStore;

#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Open an exclusive scope on `wallet_id`.
    async fn begin(&self, wallet_id: &str) -> Result<Box<dyn WalletScope>, StoreError>;

    /// Committed balance of `wallet_id`, `None` if the wallet does not exist.
    async fn balance(&self, wallet_id: &str) -> Result<Option<i64>, StoreError>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}

/// Exclusive read-check-write region over one wallet.
#[async_trait]
pub trait WalletScope: Send {
    /// Lock the wallet and return its balance, `None` when it does not exist.
    async fn lock(&mut self) -> Result<Option<i64>, StoreError>;

    /// Materialize the wallet with balance 0 if it is missing, then return the
    /// locked balance.
    async fn create(&mut self) -> Result<i64, StoreError>;

    /// Add `delta` to the balance. Returns the number of rows affected.
    async fn add(&mut self, delta: i64) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Build the store selected by `config`, running migrations first for
/// PostgreSQL.
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn BalanceStore>> {
    match config.storage_backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryBalanceStore::new())),
        StorageBackend::Postgres => {
            let pool = postgres::create_pool(&config.database).await?;
            migrations::apply(&pool, &config.database.migrations_path).await?;
            tracing::info!(path = %config.database.migrations_path, "Migrations applied successfully");
            Ok(Arc::new(PostgresBalanceStore::new(pool)))
        }
    }
}
