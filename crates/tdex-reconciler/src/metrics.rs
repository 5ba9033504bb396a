//! # Listener Metrics
//!
//! Prometheus metrics for the blockchain listener.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! tdex-reconciler = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `listener_events_total` - Counter of events handled (by kind and outcome)
//! - `listener_utxos_skipped_total` - Counter of utxos skipped on oracle failure
//! - `listener_unspents_added_total` - Counter of unspents persisted
//! - `listener_markets_funded_total` - Counter of markets funded
//! - `listener_market_transitions_total` - Counter of open/close transitions
//! - `listener_fee_account_balance` - Gauge of the last computed fee balance

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, CounterVec, Gauge, IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Events handled, labeled by kind and outcome
    pub static ref EVENTS_HANDLED: CounterVec = register_counter_vec!(
        "listener_events_total",
        "Total number of blockchain events handled",
        &["kind", "outcome"]
    )
    .expect("Failed to create EVENTS_HANDLED metric");

    /// Utxos skipped because the oracle failed
    pub static ref UTXOS_SKIPPED: IntCounter = register_int_counter!(
        "listener_utxos_skipped_total",
        "Total number of utxos skipped on confirmation failure"
    )
    .expect("Failed to create UTXOS_SKIPPED metric");

    /// Unspents persisted
    pub static ref UNSPENTS_ADDED: IntCounter = register_int_counter!(
        "listener_unspents_added_total",
        "Total number of unspents written to the ledger"
    )
    .expect("Failed to create UNSPENTS_ADDED metric");

    /// Markets funded
    pub static ref MARKETS_FUNDED: IntCounter = register_int_counter!(
        "listener_markets_funded_total",
        "Total number of markets funded"
    )
    .expect("Failed to create MARKETS_FUNDED metric");

    /// Market open/close transitions, labeled by direction
    pub static ref MARKET_TRANSITIONS: CounterVec = register_counter_vec!(
        "listener_market_transitions_total",
        "Total number of market open/close transitions",
        &["direction"]
    )
    .expect("Failed to create MARKET_TRANSITIONS metric");

    /// Last computed fee-account balance
    pub static ref FEE_ACCOUNT_BALANCE: Gauge = register_gauge!(
        "listener_fee_account_balance",
        "Fee account balance in the base asset at the last fee deposit"
    )
    .expect("Failed to create FEE_ACCOUNT_BALANCE metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a handled event
#[cfg(feature = "metrics")]
pub fn record_event(kind: &str, outcome: &str) {
    EVENTS_HANDLED.with_label_values(&[kind, outcome]).inc();
}

/// Record skipped utxos
#[cfg(feature = "metrics")]
pub fn record_utxos_skipped(count: usize) {
    UTXOS_SKIPPED.inc_by(count as u64);
}

/// Record persisted unspents
#[cfg(feature = "metrics")]
pub fn record_unspents_added(count: usize) {
    UNSPENTS_ADDED.inc_by(count as u64);
}

/// Record a market funded
#[cfg(feature = "metrics")]
pub fn record_market_funded() {
    MARKETS_FUNDED.inc();
}

/// Record markets opened or closed
#[cfg(feature = "metrics")]
pub fn record_market_transitions(direction: &str, count: usize) {
    MARKET_TRANSITIONS
        .with_label_values(&[direction])
        .inc_by(count as f64);
}

/// Update the fee balance gauge
#[cfg(feature = "metrics")]
pub fn set_fee_account_balance(balance: u64) {
    FEE_ACCOUNT_BALANCE.set(balance as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_event(_kind: &str, _outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_utxos_skipped(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_unspents_added(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_market_funded() {}

#[cfg(not(feature = "metrics"))]
pub fn record_market_transitions(_direction: &str, _count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_fee_account_balance(_balance: u64) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_callable() {
        record_event("fee_account_deposit", "committed");
        record_utxos_skipped(2);
        record_unspents_added(3);
        record_market_funded();
        record_market_transitions("open", 4);
        set_fee_account_balance(150_000);
    }
}
