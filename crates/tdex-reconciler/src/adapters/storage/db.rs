//! In-memory ledger database with unit-of-work semantics.
//!
//! Each unit of work works on a private copy of the committed state and
//! records the version it was opened at. Commit swaps the copy in if no
//! other writer committed in between; discard drops it.

use crate::domain::{CommitError, Market, StoreError, Unspent, UnspentKey};
use crate::ports::outbound::{UnitOfWork, UnitOfWorkManager};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Ledger and market state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub(crate) unspents: BTreeMap<UnspentKey, Unspent>,
    pub(crate) markets: BTreeMap<u32, Market>,
}

impl LedgerState {
    /// Unspent by key.
    pub fn unspent(&self, key: &UnspentKey) -> Option<&Unspent> {
        self.unspents.get(key)
    }

    /// Every unspent, ordered by key.
    pub fn unspents(&self) -> impl Iterator<Item = &Unspent> {
        self.unspents.values()
    }

    /// Number of tracked unspents.
    pub fn unspent_count(&self) -> usize {
        self.unspents.len()
    }

    /// Market by account index.
    pub fn market(&self, account_index: u32) -> Option<&Market> {
        self.markets.get(&account_index)
    }

    /// Every market, ordered by account index.
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }
}

#[derive(Debug, Default)]
struct Committed {
    state: LedgerState,
    version: u64,
}

/// In-memory database shared by the in-memory repositories.
///
/// Cloning shares the underlying state.
///
/// Conflicts are detected on a single version for the whole database, not
/// per key. A fee deposit reads the spent and locked flags of every fee
/// unspent to gate markets, so any committed change to the ledger can
/// invalidate its decision. The cost is that an unrelated external write
/// during an event fails that event's commit; the producer is expected to
/// announce the deposit again. External writes that change no flag leave the
/// version untouched.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDb {
    inner: Arc<RwLock<Committed>>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> LedgerState {
        self.inner.read().state.clone()
    }

    /// Number of commits applied so far.
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Open a unit of work on the current committed state.
    pub fn begin_tx(&self) -> InMemoryTx {
        let committed = self.inner.read();
        InMemoryTx {
            db: Arc::clone(&self.inner),
            base_version: committed.version,
            state: committed.state.clone(),
        }
    }

    /// Mark unspents as spent (trade settlement). Unknown keys are ignored.
    ///
    /// Commits immediately; returns how many records changed.
    pub fn mark_spent(&self, keys: &[UnspentKey]) -> usize {
        self.apply_external(keys, |u| !std::mem::replace(&mut u.spent, true))
    }

    /// Lock unspents for a pending trade. Unknown keys are ignored.
    pub fn lock_unspents(&self, keys: &[UnspentKey]) -> usize {
        self.apply_external(keys, |u| !std::mem::replace(&mut u.locked, true))
    }

    /// Release locked unspents. Unknown keys are ignored.
    pub fn unlock_unspents(&self, keys: &[UnspentKey]) -> usize {
        self.apply_external(keys, |u| std::mem::replace(&mut u.locked, false))
    }

    /// `mutate` reports whether it changed the record.
    fn apply_external(
        &self,
        keys: &[UnspentKey],
        mutate: impl Fn(&mut Unspent) -> bool,
    ) -> usize {
        let mut committed = self.inner.write();
        let mut changed = 0;
        for key in keys {
            if let Some(unspent) = committed.state.unspents.get_mut(key) {
                if mutate(unspent) {
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            committed.version += 1;
        }
        changed
    }
}

#[async_trait]
impl UnitOfWorkManager for InMemoryDb {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StoreError> {
        Ok(self.begin_tx())
    }
}

/// Unit of work over an `InMemoryDb`.
#[derive(Debug)]
pub struct InMemoryTx {
    db: Arc<RwLock<Committed>>,
    base_version: u64,
    state: LedgerState,
}

impl InMemoryTx {
    /// State as seen through this unit of work (own writes included).
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut LedgerState {
        &mut self.state
    }

    /// Version of the committed state this unit of work was opened at.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }
}

#[async_trait]
impl UnitOfWork for InMemoryTx {
    async fn commit(self) -> Result<(), CommitError> {
        let mut committed = self.db.write();
        if committed.version != self.base_version {
            return Err(CommitError::Conflict {
                expected: self.base_version,
                found: committed.version,
            });
        }
        committed.state = self.state;
        committed.version += 1;
        debug!(version = committed.version, "[storage] unit of work committed");
        Ok(())
    }

    async fn discard(self) {
        debug!(
            base_version = self.base_version,
            "[storage] unit of work discarded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unspent(txid: &str, vout: u32) -> Unspent {
        Unspent::new(txid, vout, "usdt", "addr", 100, true)
    }

    #[tokio::test]
    async fn test_commit_applies_writes() {
        let db = InMemoryDb::new();
        let mut tx = db.begin().await.unwrap();
        let u = unspent("t1", 0);
        tx.state_mut().unspents.insert(u.key(), u);

        assert_eq!(db.snapshot().unspent_count(), 0);
        tx.commit().await.unwrap();
        assert_eq!(db.snapshot().unspent_count(), 1);
        assert_eq!(db.version(), 1);
    }

    #[tokio::test]
    async fn test_discard_drops_writes() {
        let db = InMemoryDb::new();
        let before = db.snapshot();

        let mut tx = db.begin().await.unwrap();
        let u = unspent("t1", 0);
        tx.state_mut().unspents.insert(u.key(), u);
        tx.state_mut().markets.insert(7, Market::new(7, "lbtc"));
        tx.discard().await;

        assert_eq!(db.snapshot(), before);
        assert_eq!(db.version(), 0);
    }

    #[tokio::test]
    async fn test_commit_conflict_after_external_write() {
        let db = InMemoryDb::new();
        let mut seed = db.begin_tx();
        let u = unspent("t1", 0);
        seed.state_mut().unspents.insert(u.key(), u);
        seed.commit().await.unwrap();

        let mut tx = db.begin_tx();
        let u = unspent("t2", 0);
        tx.state_mut().unspents.insert(u.key(), u);

        assert_eq!(db.mark_spent(&[UnspentKey::new("t1", 0)]), 1);

        let err = tx.commit().await.unwrap_err();
        assert!(matches!(
            err,
            CommitError::Conflict {
                expected: 1,
                found: 2
            }
        ));
        assert!(db.snapshot().unspent(&UnspentKey::new("t2", 0)).is_none());
    }

    #[tokio::test]
    async fn test_unchanged_external_write_keeps_version() {
        let db = InMemoryDb::new();
        let mut seed = db.begin_tx();
        let u = unspent("t1", 0);
        seed.state_mut().unspents.insert(u.key(), u);
        seed.commit().await.unwrap();
        assert_eq!(db.mark_spent(&[UnspentKey::new("t1", 0)]), 1);
        assert_eq!(db.version(), 2);

        let mut tx = db.begin_tx();
        let u = unspent("t2", 0);
        tx.state_mut().unspents.insert(u.key(), u);

        // already spent, never locked
        assert_eq!(db.mark_spent(&[UnspentKey::new("t1", 0)]), 0);
        assert_eq!(db.unlock_unspents(&[UnspentKey::new("t1", 0)]), 0);
        assert_eq!(db.version(), 2);

        tx.commit().await.unwrap();
        assert!(db.snapshot().unspent(&UnspentKey::new("t2", 0)).is_some());
    }

    #[test]
    fn test_external_mutation_ignores_unknown_keys() {
        let db = InMemoryDb::new();
        assert_eq!(db.lock_unspents(&[UnspentKey::new("nope", 0)]), 0);
        assert_eq!(db.version(), 0);
    }
}
