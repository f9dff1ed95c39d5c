use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::error::{WalletError, WalletResult};
use crate::domain::wallet::OperationType;
use crate::infrastructure::storage::BalanceStore;
use crate::validators::wallet_validator::{validate_amount, validate_wallet_id};

/// Operations the HTTP layer needs from the wallet service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletOperations: Send + Sync {
    /// Apply a deposit or withdrawal atomically.
    async fn apply(&self, wallet_id: &str, operation_type: OperationType, amount: i64) -> WalletResult<()>;

    async fn get_balance(&self, wallet_id: &str) -> WalletResult<i64>;

    /// Round trip to the backing store.
    async fn health_check(&self) -> WalletResult<()>;
}

pub struct WalletService {
    store: Arc<dyn BalanceStore>,
}

impl WalletService {
    pub fn new(store: Arc<dyn BalanceStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}

#[async_trait]
impl WalletOperations for WalletService {
    async fn apply(&self, wallet_id: &str, operation_type: OperationType, amount: i64) -> WalletResult<()> {
        validate_wallet_id(wallet_id)?;
        validate_amount(amount)?;

        let mut scope = self
            .store
            .begin(wallet_id)
            .await
            .map_err(|e| WalletError::store("failed to begin transaction", e))?;

        let balance = match scope
            .lock()
            .await
            .map_err(|e| WalletError::store("failed to get wallet", e))?
        {
            Some(balance) => balance,
            None => {
                debug!(wallet_id, "Wallet not found, creating it");
                scope
                    .create()
                    .await
                    .map_err(|e| WalletError::store("failed to create wallet", e))?
            }
        };

        let delta = operation_type.delta(amount);
        if operation_type == OperationType::Withdraw && balance < amount {
            if let Err(e) = scope.rollback().await {
                warn!(wallet_id, error = %e, "Failed to roll back rejected withdrawal");
            }
            info!(wallet_id, balance, amount, "Withdrawal rejected: insufficient funds");
            return Err(WalletError::InsufficientFunds);
        }

        let affected = scope
            .add(delta)
            .await
            .map_err(|e| WalletError::store("failed to update balance", e))?;
        if affected == 0 {
            return Err(WalletError::NotFound);
        }

        scope
            .commit()
            .await
            .map_err(|e| WalletError::store("failed to commit transaction", e))?;

        info!(wallet_id, operation = %operation_type, amount, "Wallet operation applied");
        Ok(())
    }

    async fn get_balance(&self, wallet_id: &str) -> WalletResult<i64> {
        validate_wallet_id(wallet_id)?;

        self.store
            .balance(wallet_id)
            .await
            .map_err(|e| WalletError::store("failed to get wallet balance", e))?
            .ok_or(WalletError::NotFound)
    }

    async fn health_check(&self) -> WalletResult<()> {
        self.store
            .ping()
            .await
            .map_err(|e| WalletError::store("store health check failed", e))
    }
}
