use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;

use super::{BalanceStore, WalletScope};
use crate::domain::error::StoreError;
use crate::infrastructure::config::DatabaseConfig;

const INSERT_IF_MISSING: &str = "INSERT INTO wallet (id, balance) VALUES ($1, 0) ON CONFLICT (id) DO NOTHING";
const SELECT_FOR_UPDATE: &str = "SELECT balance FROM wallet WHERE id = $1 FOR UPDATE";
const ADD_TO_BALANCE: &str = "UPDATE wallet SET balance = balance + $1 WHERE id = $2";
const SELECT_BALANCE: &str = "SELECT balance FROM wallet WHERE id = $1";

/// Connect a pool and make sure the server answers before returning it.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.connection_string)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    tracing::info!(max_connections = config.max_connections, "Postgres connection pool created");
    Ok(pool)
}

/// PostgreSQL-backed store. The exclusive scope is a transaction holding a
/// `FOR UPDATE` lock on the wallet row.
#[derive(Clone)]
pub struct PostgresBalanceStore {
    pool: PgPool,
}

impl PostgresBalanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceStore for PostgresBalanceStore {
    async fn begin(&self, wallet_id: &str) -> Result<Box<dyn WalletScope>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresScope {
            wallet_id: wallet_id.to_string(),
            tx,
        }))
    }

    async fn balance(&self, wallet_id: &str) -> Result<Option<i64>, StoreError> {
        let balance = sqlx::query_scalar::<_, i64>(SELECT_BALANCE)
            .bind(wallet_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(balance)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// Dropping the scope without committing rolls the transaction back.
struct PostgresScope {
    wallet_id: String,
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl WalletScope for PostgresScope {
    async fn lock(&mut self) -> Result<Option<i64>, StoreError> {
        let balance = sqlx::query_scalar::<_, i64>(SELECT_FOR_UPDATE)
            .bind(&self.wallet_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(balance)
    }

    async fn create(&mut self) -> Result<i64, StoreError> {
        // A concurrent creator may win the insert; ON CONFLICT waits for it and
        // the SELECT below then locks the row it committed.
        sqlx::query(INSERT_IF_MISSING)
            .bind(&self.wallet_id)
            .execute(&mut *self.tx)
            .await?;

        let balance = sqlx::query_scalar::<_, i64>(SELECT_FOR_UPDATE)
            .bind(&self.wallet_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(balance)
    }

    async fn add(&mut self, delta: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(ADD_TO_BALANCE)
            .bind(delta)
            .bind(&self.wallet_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
