//! In-memory `VaultRepository`.
//!
//! Address derivation happens elsewhere; this index only records the
//! addresses handed to it, per account.

use super::db::InMemoryTx;
use crate::domain::{AccountKind, Address, StoreError};
use crate::ports::outbound::VaultRepository;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Derived addresses per account.
///
/// Cloning shares the index, so addresses registered after the listener
/// started are visible to it.
#[derive(Clone, Debug, Default)]
pub struct InMemoryVaultRepository {
    addresses: Arc<RwLock<HashMap<AccountKind, Vec<Address>>>>,
}

impl InMemoryVaultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `register_address`.
    pub fn with_address(self, account: AccountKind, address: impl Into<Address>) -> Self {
        self.register_address(account, address);
        self
    }

    /// Record a derived address. Registering the same address twice is a no-op.
    pub fn register_address(&self, account: AccountKind, address: impl Into<Address>) {
        let address = address.into();
        let mut addresses = self.addresses.write();
        let derived = addresses.entry(account).or_default();
        if !derived.contains(&address) {
            derived.push(address);
        }
    }
}

#[async_trait]
impl VaultRepository<InMemoryTx> for InMemoryVaultRepository {
    async fn get_derived_addresses(
        &self,
        _tx: &mut InMemoryTx,
        account: AccountKind,
    ) -> Result<Vec<Address>, StoreError> {
        Ok(self
            .addresses
            .read()
            .get(&account)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryDb;

    #[tokio::test]
    async fn test_addresses_are_scoped_per_account() {
        let vault = InMemoryVaultRepository::new()
            .with_address(AccountKind::Fee, "fee-1")
            .with_address(AccountKind::Fee, "fee-2")
            .with_address(AccountKind::Fee, "fee-1")
            .with_address(AccountKind::Market(5), "mkt-1");

        let db = InMemoryDb::new();
        let mut tx = db.begin_tx();
        assert_eq!(
            vault
                .get_derived_addresses(&mut tx, AccountKind::Fee)
                .await
                .unwrap(),
            vec!["fee-1".to_string(), "fee-2".to_string()]
        );
        assert!(vault
            .get_derived_addresses(&mut tx, AccountKind::Market(6))
            .await
            .unwrap()
            .is_empty());
    }
}
