//! # Value Objects
//!
//! Immutable identifiers and small result types.

use super::errors::{AssetHash, Txid};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an unspent output: `(txid, vout)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnspentKey {
    /// Transaction id.
    pub txid: Txid,
    /// Output index.
    pub vout: u32,
}

impl UnspentKey {
    /// Create a key.
    pub fn new(txid: impl Into<Txid>, vout: u32) -> Self {
        Self {
            txid: txid.into(),
            vout,
        }
    }
}

impl fmt::Display for UnspentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Reference to an unspent output tagged with its asset.
///
/// Used as the funding outpoints of a market.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutpointWithAsset {
    /// Asset carried by the output.
    pub asset: AssetHash,
    /// Transaction id.
    pub txid: Txid,
    /// Output index.
    pub vout: u32,
}

impl OutpointWithAsset {
    /// Key of the referenced unspent.
    pub fn key(&self) -> UnspentKey {
        UnspentKey::new(self.txid.clone(), self.vout)
    }
}

/// Logical account owning a set of derived addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    /// Fee collection account; its balance gates trading.
    Fee,
    /// Per-market account identified by its account index.
    Market(u32),
}

impl AccountKind {
    /// Derivation account index.
    pub fn index(&self) -> u32 {
        match self {
            AccountKind::Fee => super::invariants::FEE_ACCOUNT,
            AccountKind::Market(index) => *index,
        }
    }
}

/// Result of comparing fee-account liquidity against the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Liquidity {
    /// Balance at or above threshold: markets may trade.
    Sufficient,
    /// Balance strictly below threshold: markets must be closed.
    Insufficient,
}

/// How the listener finished one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// Handler succeeded and the unit of work committed.
    Committed {
        /// Utxos skipped because the oracle failed.
        skipped_utxos: usize,
    },
    /// Handler aborted; nothing from this event is visible.
    Discarded {
        /// Operator-facing reason.
        reason: String,
    },
    /// Handler succeeded but the commit failed.
    CommitFailed {
        /// Operator-facing reason.
        reason: String,
    },
}

impl EventOutcome {
    /// Check if the event's effects were applied.
    pub fn is_committed(&self) -> bool {
        matches!(self, EventOutcome::Committed { .. })
    }

    /// Label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            EventOutcome::Committed { .. } => "committed",
            EventOutcome::Discarded { .. } => "discarded",
            EventOutcome::CommitFailed { .. } => "commit_failed",
        }
    }
}

/// Aggregate statistics returned when the event stream closes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Events received.
    pub events: u64,
    /// Events committed.
    pub committed: u64,
    /// Events discarded.
    pub discarded: u64,
    /// Events whose commit failed.
    pub commit_failed: u64,
    /// Utxos skipped on oracle failure.
    pub skipped_utxos: u64,
}

impl ListenerStats {
    /// Account one event outcome.
    pub fn record(&mut self, outcome: &EventOutcome) {
        self.events += 1;
        match outcome {
            EventOutcome::Committed { skipped_utxos } => {
                self.committed += 1;
                self.skipped_utxos += *skipped_utxos as u64;
            }
            EventOutcome::Discarded { .. } => self.discarded += 1,
            EventOutcome::CommitFailed { .. } => self.commit_failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unspent_key_display() {
        let key = UnspentKey::new("aa", 2);
        assert_eq!(key.to_string(), "aa:2");
    }

    #[test]
    fn test_account_kind_index() {
        assert_eq!(AccountKind::Fee.index(), 0);
        assert_eq!(AccountKind::Market(7).index(), 7);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = ListenerStats::default();
        stats.record(&EventOutcome::Committed { skipped_utxos: 2 });
        stats.record(&EventOutcome::Discarded {
            reason: "boom".into(),
        });
        stats.record(&EventOutcome::CommitFailed {
            reason: "conflict".into(),
        });

        assert_eq!(stats.events, 3);
        assert_eq!(stats.committed, 1);
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.commit_failed, 1);
        assert_eq!(stats.skipped_utxos, 2);
    }
}
