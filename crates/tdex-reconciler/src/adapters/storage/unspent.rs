//! In-memory `UnspentRepository`.

use super::db::InMemoryTx;
use crate::domain::{StoreError, Unspent};
use crate::ports::outbound::UnspentRepository;
use async_trait::async_trait;
use std::collections::btree_map::Entry;

/// Unspent ledger stored in the unit of work's `LedgerState`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InMemoryUnspentRepository;

impl InMemoryUnspentRepository {
    pub fn new() -> Self {
        Self
    }

    fn sum(
        tx: &InMemoryTx,
        address: &str,
        asset: &str,
        include: impl Fn(&Unspent) -> bool,
    ) -> u64 {
        tx.state()
            .unspents()
            .filter(|u| u.address == address && u.asset == asset && include(u))
            .fold(0u64, |acc, u| acc.saturating_add(u.value))
    }
}

#[async_trait]
impl UnspentRepository<InMemoryTx> for InMemoryUnspentRepository {
    async fn add_unspents(
        &self,
        tx: &mut InMemoryTx,
        unspents: Vec<Unspent>,
    ) -> Result<(), StoreError> {
        let ledger = &mut tx.state_mut().unspents;
        for unspent in unspents {
            match ledger.entry(unspent.key()) {
                Entry::Occupied(mut tracked) => tracked.get_mut().merge_observation(unspent),
                Entry::Vacant(slot) => {
                    slot.insert(unspent);
                }
            }
        }
        Ok(())
    }

    async fn get_all_unspents(&self, tx: &mut InMemoryTx) -> Result<Vec<Unspent>, StoreError> {
        Ok(tx.state().unspents().cloned().collect())
    }

    async fn get_available_unspents(
        &self,
        tx: &mut InMemoryTx,
    ) -> Result<Vec<Unspent>, StoreError> {
        Ok(tx
            .state()
            .unspents()
            .filter(|u| u.is_available())
            .cloned()
            .collect())
    }

    async fn get_balance(
        &self,
        tx: &mut InMemoryTx,
        address: &str,
        asset: &str,
    ) -> Result<u64, StoreError> {
        Ok(Self::sum(tx, address, asset, Unspent::counts_towards_balance))
    }

    async fn get_unlocked_balance(
        &self,
        tx: &mut InMemoryTx,
        address: &str,
        asset: &str,
    ) -> Result<u64, StoreError> {
        Ok(Self::sum(tx, address, asset, |u| {
            u.counts_towards_balance() && !u.locked
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryDb;
    use crate::domain::UnspentKey;
    use crate::ports::outbound::UnitOfWork;

    #[tokio::test]
    async fn test_add_same_identity_twice_keeps_one_record() {
        let db = InMemoryDb::new();
        let repo = InMemoryUnspentRepository::new();

        let mut tx = db.begin_tx();
        let u = Unspent::new("t1", 0, "lbtc", "fee-addr", 40_000, true);
        repo.add_unspents(&mut tx, vec![u.clone()]).await.unwrap();
        repo.add_unspents(&mut tx, vec![u]).await.unwrap();

        assert_eq!(repo.get_all_unspents(&mut tx).await.unwrap().len(), 1);
        assert_eq!(
            repo.get_balance(&mut tx, "fee-addr", "lbtc").await.unwrap(),
            40_000
        );
    }

    #[tokio::test]
    async fn test_readd_preserves_spent_flag() {
        let db = InMemoryDb::new();
        let repo = InMemoryUnspentRepository::new();

        let mut tx = db.begin_tx();
        let u = Unspent::new("t1", 0, "lbtc", "addr", 10, true);
        repo.add_unspents(&mut tx, vec![u.clone()]).await.unwrap();
        tx.commit().await.unwrap();

        db.mark_spent(&[UnspentKey::new("t1", 0)]);

        let mut tx = db.begin_tx();
        repo.add_unspents(&mut tx, vec![u]).await.unwrap();
        assert_eq!(repo.get_balance(&mut tx, "addr", "lbtc").await.unwrap(), 0);
        assert!(repo.get_available_unspents(&mut tx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balance_filters_address_and_asset() {
        let db = InMemoryDb::new();
        let repo = InMemoryUnspentRepository::new();

        let mut tx = db.begin_tx();
        repo.add_unspents(
            &mut tx,
            vec![
                Unspent::new("t1", 0, "lbtc", "a", 10, true),
                Unspent::new("t1", 1, "usdt", "a", 20, true),
                Unspent::new("t2", 0, "lbtc", "b", 30, true),
                Unspent::new("t3", 0, "lbtc", "a", 40, false),
            ],
        )
        .await
        .unwrap();

        assert_eq!(repo.get_balance(&mut tx, "a", "lbtc").await.unwrap(), 10);
        assert_eq!(repo.get_balance(&mut tx, "a", "usdt").await.unwrap(), 20);
        assert_eq!(repo.get_balance(&mut tx, "b", "lbtc").await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_unlocked_balance_excludes_locked() {
        let db = InMemoryDb::new();
        let repo = InMemoryUnspentRepository::new();

        let mut tx = db.begin_tx();
        repo.add_unspents(
            &mut tx,
            vec![
                Unspent::new("t1", 0, "lbtc", "a", 10, true),
                Unspent::new("t2", 0, "lbtc", "a", 5, true),
            ],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        db.lock_unspents(&[UnspentKey::new("t2", 0)]);

        let mut tx = db.begin_tx();
        assert_eq!(repo.get_balance(&mut tx, "a", "lbtc").await.unwrap(), 15);
        assert_eq!(
            repo.get_unlocked_balance(&mut tx, "a", "lbtc").await.unwrap(),
            10
        );
    }
}
