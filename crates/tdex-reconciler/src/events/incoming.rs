//! Incoming events for the blockchain listener

use crate::domain::{Address, AssetHash, OutpointWithAsset, Txid, Unspent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An output observed at a watched address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoNotice {
    /// Transaction id.
    pub txid: Txid,
    /// Asset carried by the output.
    pub asset: AssetHash,
    /// Output index.
    pub vout: u32,
    /// Value in the asset's smallest unit.
    pub value: u64,
}

impl UtxoNotice {
    pub fn new(txid: impl Into<Txid>, asset: impl Into<AssetHash>, vout: u32, value: u64) -> Self {
        Self {
            txid: txid.into(),
            asset: asset.into(),
            vout,
            value,
        }
    }

    /// Ledger record for this output, owned by `address`.
    pub fn to_unspent(&self, address: &str, confirmed: bool) -> Unspent {
        Unspent::new(
            self.txid.clone(),
            self.vout,
            self.asset.clone(),
            address,
            self.value,
            confirmed,
        )
    }

    /// Funding outpoint for this output.
    pub fn to_outpoint(&self) -> OutpointWithAsset {
        OutpointWithAsset {
            asset: self.asset.clone(),
            txid: self.txid.clone(),
            vout: self.vout,
        }
    }
}

/// Notification from the address watcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockchainEvent {
    /// Deposit to one of the fee account's addresses.
    FeeAccountDeposit {
        address: Address,
        utxos: Vec<UtxoNotice>,
    },
    /// Deposit to one of a market account's addresses.
    MarketAccountDeposit {
        account_index: u32,
        address: Address,
        utxos: Vec<UtxoNotice>,
    },
    /// A watched transaction reached the confirmation threshold.
    ///
    /// Reserved extension point: acknowledged and committed with no effect.
    TransactionConfirmed { txid: Txid },
}

impl BlockchainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BlockchainEvent::FeeAccountDeposit { .. } => EventKind::FeeAccountDeposit,
            BlockchainEvent::MarketAccountDeposit { .. } => EventKind::MarketAccountDeposit,
            BlockchainEvent::TransactionConfirmed { .. } => EventKind::TransactionConfirmed,
        }
    }

    /// Utxos carried by the event (empty for confirmations).
    pub fn utxos(&self) -> &[UtxoNotice] {
        match self {
            BlockchainEvent::FeeAccountDeposit { utxos, .. }
            | BlockchainEvent::MarketAccountDeposit { utxos, .. } => utxos,
            BlockchainEvent::TransactionConfirmed { .. } => &[],
        }
    }
}

/// Event discriminant, used for logging and metrics labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    FeeAccountDeposit,
    MarketAccountDeposit,
    TransactionConfirmed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FeeAccountDeposit => "fee_account_deposit",
            EventKind::MarketAccountDeposit => "market_account_deposit",
            EventKind::TransactionConfirmed => "transaction_confirmed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
