use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BalanceStore, WalletScope};
use crate::domain::error::StoreError;

/// One wallet: a writer lock held by a scope for its whole lifetime, and the
/// committed balance, `None` until the first committed write.
#[derive(Default)]
struct WalletSlot {
    writer: Arc<Mutex<()>>,
    committed: RwLock<Option<i64>>,
}

type Slot = Arc<WalletSlot>;
type Wallets = Arc<RwLock<HashMap<String, Slot>>>;

// Critical sections below never await and leave the data consistent, so a
// poisoned lock is still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local store. Writers on one wallet queue up on its writer lock
/// while other wallets proceed. Reads only touch the committed value and never
/// wait for an open scope.
#[derive(Default)]
pub struct InMemoryBalanceStore {
    wallets: Wallets,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, wallet_id: &str) -> Slot {
        if let Some(slot) = read(&self.wallets).get(wallet_id) {
            return Arc::clone(slot);
        }

        let mut wallets = write(&self.wallets);
        Arc::clone(wallets.entry(wallet_id.to_string()).or_default())
    }

    #[cfg(test)]
    fn tracked_wallets(&self) -> usize {
        read(&self.wallets).len()
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn begin(&self, wallet_id: &str) -> Result<Box<dyn WalletScope>, StoreError> {
        let slot = self.slot(wallet_id);
        let guard = Arc::clone(&slot.writer).lock_owned().await;
        let working = *read(&slot.committed);
        Ok(Box::new(MemoryScope {
            wallet_id: wallet_id.to_string(),
            working,
            wallets: Arc::clone(&self.wallets),
            slot,
            _guard: guard,
        }))
    }

    async fn balance(&self, wallet_id: &str) -> Result<Option<i64>, StoreError> {
        let balance = read(&self.wallets)
            .get(wallet_id)
            .and_then(|slot| *read(&slot.committed));
        Ok(balance)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Writes land in `working` and are copied into the slot on commit.
struct MemoryScope {
    wallet_id: String,
    working: Option<i64>,
    wallets: Wallets,
    slot: Slot,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for MemoryScope {
    /// Forget a wallet that was never committed and that nobody else is
    /// waiting on, so rejected operations on unknown IDs leave nothing behind.
    fn drop(&mut self) {
        if read(&self.slot.committed).is_some() {
            return;
        }

        let mut wallets = write(&self.wallets);
        let ours = wallets
            .get(&self.wallet_id)
            .is_some_and(|slot| Arc::ptr_eq(slot, &self.slot));
        // Map entry plus this scope: every other user clones the slot under
        // the map lock, which is held here.
        if ours && Arc::strong_count(&self.slot) == 2 {
            wallets.remove(&self.wallet_id);
        }
    }
}

#[async_trait]
impl WalletScope for MemoryScope {
    async fn lock(&mut self) -> Result<Option<i64>, StoreError> {
        Ok(self.working)
    }

    async fn create(&mut self) -> Result<i64, StoreError> {
        Ok(*self.working.get_or_insert(0))
    }

    async fn add(&mut self, delta: i64) -> Result<u64, StoreError> {
        let Some(balance) = self.working else {
            return Ok(0);
        };
        let updated = balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::Overflow(self.wallet_id.clone()))?;
        self.working = Some(updated);
        Ok(1)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        *write(&self.slot.committed) = self.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_uncommitted_scope_leaves_no_trace() {
        let store = InMemoryBalanceStore::new();

        let mut scope = store.begin("w1").await.unwrap();
        assert_eq!(scope.lock().await.unwrap(), None);
        assert_eq!(scope.create().await.unwrap(), 0);
        assert_eq!(scope.add(100).await.unwrap(), 1);
        drop(scope);

        assert_eq!(store.balance("w1").await.unwrap(), None);
        assert_eq!(store.tracked_wallets(), 0);
    }

    #[tokio::test]
    async fn test_commit_publishes_balance() {
        let store = InMemoryBalanceStore::new();

        let mut scope = store.begin("w1").await.unwrap();
        scope.create().await.unwrap();
        scope.add(100).await.unwrap();
        scope.commit().await.unwrap();

        assert_eq!(store.balance("w1").await.unwrap(), Some(100));

        let mut scope = store.begin("w1").await.unwrap();
        assert_eq!(scope.lock().await.unwrap(), Some(100));
        scope.add(-40).await.unwrap();
        scope.rollback().await.unwrap();

        assert_eq!(store.balance("w1").await.unwrap(), Some(100));
        assert_eq!(store.tracked_wallets(), 1);
    }

    #[tokio::test]
    async fn test_rejected_scopes_on_unknown_ids_are_forgotten() {
        let store = InMemoryBalanceStore::new();

        for i in 0..10 {
            let mut scope = store.begin(&format!("junk-{i}")).await.unwrap();
            scope.create().await.unwrap();
            scope.rollback().await.unwrap();
        }
        assert_eq!(store.tracked_wallets(), 0);
    }

    #[tokio::test]
    async fn test_waiting_scope_keeps_slot() {
        let store = Arc::new(InMemoryBalanceStore::new());
        let held = store.begin("w1").await.unwrap();

        let contender = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut scope = store.begin("w1").await?;
                scope.create().await?;
                scope.add(7).await?;
                scope.commit().await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The contender already holds the slot, so releasing must not drop it.
        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(store.balance("w1").await.unwrap(), Some(7));
        assert_eq!(store.tracked_wallets(), 1);
    }

    #[tokio::test]
    async fn test_add_on_missing_wallet_affects_nothing() {
        let store = InMemoryBalanceStore::new();
        let mut scope = store.begin("ghost").await.unwrap();
        assert_eq!(scope.add(10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overflow_is_a_store_error() {
        let store = InMemoryBalanceStore::new();
        let mut scope = store.begin("w1").await.unwrap();
        scope.create().await.unwrap();
        scope.add(i64::MAX).await.unwrap();

        let err = scope.add(1).await.unwrap_err();
        assert!(matches!(err, StoreError::Overflow(ref id) if id == "w1"));
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_for_open_scope() {
        let store = InMemoryBalanceStore::new();
        let mut scope = store.begin("w1").await.unwrap();
        scope.create().await.unwrap();
        scope.add(100).await.unwrap();
        scope.commit().await.unwrap();

        let mut open = store.begin("w1").await.unwrap();
        open.add(-60).await.unwrap();

        let balance = tokio::time::timeout(Duration::from_millis(100), store.balance("w1"))
            .await
            .expect("read blocked behind an open scope")
            .unwrap();
        assert_eq!(balance, Some(100));

        open.commit().await.unwrap();
        assert_eq!(store.balance("w1").await.unwrap(), Some(40));
    }

    #[tokio::test]
    async fn test_scope_is_exclusive_per_wallet() {
        let store = Arc::new(InMemoryBalanceStore::new());
        let held = store.begin("w1").await.unwrap();

        let contender = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.begin("w1").await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        // Another wallet is not blocked by the held scope.
        let other = tokio::time::timeout(Duration::from_secs(1), store.begin("w2")).await;
        assert!(other.is_ok());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire the scope once it is released")
            .unwrap()
            .unwrap();
    }
}
