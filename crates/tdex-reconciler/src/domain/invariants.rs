//! # Domain Invariants
//!
//! Business rules that gate trading.

use super::entities::Market;
use super::value_objects::Liquidity;

/// Derivation account index of the fee account.
pub const FEE_ACCOUNT: u32 = 0;

/// First derivation account index used by markets.
pub const MARKET_ACCOUNT_START: u32 = 5;

/// Default fee-account balance threshold (base asset smallest unit).
pub const DEFAULT_FEE_BALANCE_THRESHOLD: u64 = 5000;

/// Liquid Bitcoin asset hash, the default base asset.
pub const LBTC_ASSET: &str = "6f0279e9ed041c3d710a9f57d0c02928416460c4b722ae3457a11eec381c526d";

/// Invariant: liquidity gating.
///
/// Evaluated fresh on every fee deposit. A balance exactly at the threshold
/// is sufficient; strictly below is not. There is no hysteresis.
pub fn evaluate_liquidity(fee_balance: u64, threshold: u64) -> Liquidity {
    if fee_balance < threshold {
        Liquidity::Insufficient
    } else {
        Liquidity::Sufficient
    }
}

/// Invariant: a funded market stays funded with the same outpoints.
pub fn invariant_funding_preserved(before: &Market, after: &Market) -> bool {
    !before.is_funded()
        || (after.is_funded() && before.fund_outpoints() == after.fund_outpoints())
}

/// Invariant: only funded markets are tradable.
pub fn invariant_tradable_implies_funded(market: &Market) -> bool {
    !market.is_tradable() || market.is_funded()
}

/// Invariant: a quote asset identifies at most one funded market.
///
/// Returns the account index of another funded market already quoted in
/// `market`'s quote asset.
pub fn quote_asset_holder<'a>(
    markets: impl IntoIterator<Item = &'a Market>,
    market: &Market,
) -> Option<u32> {
    if !market.is_funded() {
        return None;
    }
    markets
        .into_iter()
        .find(|m| {
            m.account_index() != market.account_index()
                && m.is_funded()
                && m.quote_asset() == market.quote_asset()
        })
        .map(Market::account_index)
}
