//! In-memory `MarketRepository`.

use super::db::InMemoryTx;
use crate::domain::{
    invariant_funding_preserved, invariant_tradable_implies_funded, quote_asset_holder, AssetHash,
    Market, StoreError,
};
use crate::ports::outbound::{MarketRepository, MarketUpdate};
use async_trait::async_trait;
use tracing::debug;

/// Markets stored in the unit of work's `LedgerState`, keyed by account index.
#[derive(Clone, Debug)]
pub struct InMemoryMarketRepository {
    base_asset: AssetHash,
}

impl InMemoryMarketRepository {
    /// Repository creating markets against `base_asset`.
    pub fn new(base_asset: impl Into<AssetHash>) -> Self {
        Self {
            base_asset: base_asset.into(),
        }
    }

    fn by_quote_asset<'a>(
        tx: &'a mut InMemoryTx,
        quote_asset: &str,
    ) -> Result<&'a mut Market, StoreError> {
        if quote_asset.is_empty() {
            return Err(StoreError::MarketNotFound(String::new()));
        }
        tx.state_mut()
            .markets
            .values_mut()
            .find(|m| m.quote_asset() == quote_asset)
            .ok_or_else(|| StoreError::MarketNotFound(quote_asset.to_string()))
    }
}

#[async_trait]
impl MarketRepository<InMemoryTx> for InMemoryMarketRepository {
    async fn get_or_create_market(
        &self,
        tx: &mut InMemoryTx,
        account_index: u32,
    ) -> Result<Market, StoreError> {
        let market = tx
            .state_mut()
            .markets
            .entry(account_index)
            .or_insert_with(|| {
                debug!(account_index, "[storage] market created");
                Market::new(account_index, self.base_asset.clone())
            });
        Ok(market.clone())
    }

    async fn get_market_by_account(
        &self,
        tx: &mut InMemoryTx,
        account_index: u32,
    ) -> Result<Option<Market>, StoreError> {
        Ok(tx.state().market(account_index).cloned())
    }

    async fn get_tradable_markets(&self, tx: &mut InMemoryTx) -> Result<Vec<Market>, StoreError> {
        Ok(tx
            .state()
            .markets()
            .filter(|m| m.is_funded())
            .cloned()
            .collect())
    }

    async fn update_market(
        &self,
        tx: &mut InMemoryTx,
        account_index: u32,
        update: MarketUpdate,
    ) -> Result<(), StoreError> {
        let markets = &mut tx.state_mut().markets;
        let current = markets
            .get(&account_index)
            .cloned()
            .ok_or(StoreError::AccountNotFound(account_index))?;
        let updated = update(current.clone())?;
        if !invariant_funding_preserved(&current, &updated)
            || !invariant_tradable_implies_funded(&updated)
        {
            return Err(StoreError::Backend(format!(
                "update of market {} breaks its funding invariants",
                account_index
            )));
        }
        // open/close address markets by quote asset
        if let Some(holder) = quote_asset_holder(markets.values(), &updated) {
            return Err(StoreError::QuoteAssetInUse {
                quote_asset: updated.quote_asset().to_string(),
                account_index: holder,
            });
        }
        markets.insert(account_index, updated);
        Ok(())
    }

    async fn open_market(&self, tx: &mut InMemoryTx, quote_asset: &str) -> Result<(), StoreError> {
        Self::by_quote_asset(tx, quote_asset)?.make_tradable()?;
        Ok(())
    }

    async fn close_market(&self, tx: &mut InMemoryTx, quote_asset: &str) -> Result<(), StoreError> {
        Self::by_quote_asset(tx, quote_asset)?.make_not_tradable();
        Ok(())
    }
}
