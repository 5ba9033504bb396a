//! # Domain Entities
//!
//! `Unspent` (a tracked chain output) and `Market` (a tradable pair backed by
//! a dedicated account).

use super::errors::{Address, AssetHash, MarketError, Txid};
use super::value_objects::{OutpointWithAsset, UnspentKey};
use serde::{Deserialize, Serialize};

/// A tracked chain output owned by one of the daemon's addresses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unspent {
    /// Transaction id.
    pub txid: Txid,
    /// Output index.
    pub vout: u32,
    /// Asset carried by the output.
    pub asset: AssetHash,
    /// Owning address.
    pub address: Address,
    /// Value in the asset's smallest unit.
    pub value: u64,
    /// Spent by a settled trade.
    pub spent: bool,
    /// Reserved by a pending trade.
    pub locked: bool,
    /// Value blinding factor, when the output is confidential.
    pub value_blinder: Option<Vec<u8>>,
    /// Asset blinding factor, when the output is confidential.
    pub asset_blinder: Option<Vec<u8>>,
    /// Transaction reached the confirmation threshold.
    pub confirmed: bool,
}

impl Unspent {
    /// Create an unspent observed on chain. Spent and locked start cleared.
    pub fn new(
        txid: impl Into<Txid>,
        vout: u32,
        asset: impl Into<AssetHash>,
        address: impl Into<Address>,
        value: u64,
        confirmed: bool,
    ) -> Self {
        Self {
            txid: txid.into(),
            vout,
            asset: asset.into(),
            address: address.into(),
            value,
            spent: false,
            locked: false,
            value_blinder: None,
            asset_blinder: None,
            confirmed,
        }
    }

    /// Identity of this output.
    pub fn key(&self) -> UnspentKey {
        UnspentKey::new(self.txid.clone(), self.vout)
    }

    /// Neither spent nor locked.
    pub fn is_available(&self) -> bool {
        !self.spent && !self.locked
    }

    /// Counts towards the balance of its address.
    pub fn counts_towards_balance(&self) -> bool {
        !self.spent && self.confirmed
    }

    /// Re-observation of an already tracked output.
    ///
    /// Chain attributes are refreshed; spent/locked are owned by trade
    /// settlement and are kept.
    pub fn merge_observation(&mut self, observed: Unspent) {
        let spent = self.spent;
        let locked = self.locked;
        *self = observed;
        self.spent = spent;
        self.locked = locked;
    }
}

/// A market backed by a dedicated account.
///
/// Identity is `(quote_asset, account_index)`; the quote asset is only known
/// once the market has been funded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    account_index: u32,
    base_asset: AssetHash,
    quote_asset: AssetHash,
    fund_outpoints: Vec<OutpointWithAsset>,
    funded: bool,
    tradable: bool,
}

impl Market {
    /// Create an unfunded, closed market.
    pub fn new(account_index: u32, base_asset: impl Into<AssetHash>) -> Self {
        Self {
            account_index,
            base_asset: base_asset.into(),
            quote_asset: String::new(),
            fund_outpoints: Vec::new(),
            funded: false,
            tradable: false,
        }
    }

    /// Account index.
    pub fn account_index(&self) -> u32 {
        self.account_index
    }

    /// Base asset hash.
    pub fn base_asset(&self) -> &str {
        &self.base_asset
    }

    /// Quote asset hash (empty until funded).
    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    /// Outpoints of the first funding deposit.
    pub fn fund_outpoints(&self) -> &[OutpointWithAsset] {
        &self.fund_outpoints
    }

    /// Check if the market received its initial liquidity.
    pub fn is_funded(&self) -> bool {
        self.funded
    }

    /// Check if the market is open for trading.
    pub fn is_tradable(&self) -> bool {
        self.tradable
    }

    /// Fund the market with its first deposit.
    ///
    /// A funded market is never re-funded: calling this again is a no-op
    /// and the original outpoints are kept.
    pub fn fund_market(&mut self, outpoints: Vec<OutpointWithAsset>) -> Result<(), MarketError> {
        if self.funded {
            return Ok(());
        }

        if outpoints.is_empty() {
            return Err(MarketError::EmptyFundingOutpoints {
                account_index: self.account_index,
            });
        }

        let quote_asset = outpoints
            .iter()
            .find(|o| o.asset != self.base_asset)
            .map(|o| o.asset.clone())
            .ok_or(MarketError::MissingQuoteAsset {
                account_index: self.account_index,
            })?;

        self.quote_asset = quote_asset;
        self.fund_outpoints = outpoints;
        self.funded = true;
        Ok(())
    }

    /// Open the market for trading.
    pub fn make_tradable(&mut self) -> Result<(), MarketError> {
        if !self.funded {
            return Err(MarketError::NotFunded {
                account_index: self.account_index,
            });
        }
        self.tradable = true;
        Ok(())
    }

    /// Close the market.
    pub fn make_not_tradable(&mut self) {
        self.tradable = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "base";

    fn outpoint(asset: &str, txid: &str, vout: u32) -> OutpointWithAsset {
        OutpointWithAsset {
            asset: asset.to_string(),
            txid: txid.to_string(),
            vout,
        }
    }

    #[test]
    fn test_new_market_is_unfunded_and_closed() {
        let market = Market::new(5, BASE);
        assert!(!market.is_funded());
        assert!(!market.is_tradable());
        assert!(market.quote_asset().is_empty());
    }

    #[test]
    fn test_fund_market_sets_quote_asset() {
        let mut market = Market::new(5, BASE);
        market
            .fund_market(vec![outpoint(BASE, "t1", 0), outpoint("usdt", "t2", 1)])
            .unwrap();

        assert!(market.is_funded());
        assert_eq!(market.quote_asset(), "usdt");
        assert_eq!(market.fund_outpoints().len(), 2);
    }

    #[test]
    fn test_fund_market_is_idempotent() {
        let mut market = Market::new(5, BASE);
        market.fund_market(vec![outpoint("usdt", "t1", 0)]).unwrap();
        market.fund_market(vec![outpoint("eurx", "t9", 3)]).unwrap();

        assert_eq!(market.quote_asset(), "usdt");
        assert_eq!(market.fund_outpoints(), &[outpoint("usdt", "t1", 0)]);
    }

    #[test]
    fn test_fund_market_rejects_empty_outpoints() {
        let mut market = Market::new(5, BASE);
        assert_eq!(
            market.fund_market(vec![]),
            Err(MarketError::EmptyFundingOutpoints { account_index: 5 })
        );
        assert!(!market.is_funded());
    }

    #[test]
    fn test_fund_market_rejects_base_only() {
        let mut market = Market::new(5, BASE);
        assert_eq!(
            market.fund_market(vec![outpoint(BASE, "t1", 0)]),
            Err(MarketError::MissingQuoteAsset { account_index: 5 })
        );
        assert!(!market.is_funded());
    }

    #[test]
    fn test_unfunded_market_cannot_open() {
        let mut market = Market::new(5, BASE);
        assert!(market.make_tradable().is_err());

        market.fund_market(vec![outpoint("usdt", "t1", 0)]).unwrap();
        market.make_tradable().unwrap();
        assert!(market.is_tradable());

        market.make_not_tradable();
        assert!(!market.is_tradable());
        assert!(market.is_funded());
    }

    #[test]
    fn test_merge_observation_keeps_trade_flags() {
        let mut tracked = Unspent::new("t1", 0, "usdt", "addr", 100, true);
        tracked.spent = true;
        tracked.locked = true;

        tracked.merge_observation(Unspent::new("t1", 0, "usdt", "addr", 100, true));
        assert!(tracked.spent);
        assert!(tracked.locked);
    }

    #[test]
    fn test_balance_ignores_spent() {
        let mut unspent = Unspent::new("t1", 0, "usdt", "addr", 100, true);
        assert!(unspent.counts_towards_balance());
        unspent.spent = true;
        assert!(!unspent.counts_towards_balance());
    }
}
