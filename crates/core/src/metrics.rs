//! Metrics definitions for the transfer controller.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`. Without an installed
//! recorder every call here is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "simulations_total",
        "Total number of transfer dry-runs, by outcome"
    );
    describe_counter!(
        "transfers_submitted_total",
        "Total number of transfers handed to the wallet for signing"
    );
    describe_counter!(
        "transfers_finalized_total",
        "Total number of transfers recorded in history, by status"
    );
    describe_counter!(
        "wallet_rejections_total",
        "Total number of signature requests declined or failed in the wallet"
    );
    describe_counter!(
        "stale_results_discarded_total",
        "Total number of async results dropped because the request changed"
    );
    describe_histogram!(
        "confirmation_duration_seconds",
        "Time from broadcast to a final receipt in seconds"
    );
}

/// Record a simulation outcome.
///
/// # Arguments
/// * `outcome` - "success" or "failure"
pub fn record_simulation(outcome: &str) {
    counter!("simulations_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a transfer handed to the wallet.
pub fn record_transfer_submitted() {
    counter!("transfers_submitted_total").increment(1);
}

/// Record a history entry.
///
/// # Arguments
/// * `status` - "success" or "error"
pub fn record_transfer_finalized(status: &str) {
    counter!("transfers_finalized_total", "status" => status.to_string()).increment(1);
}

/// Record a wallet-side failure before broadcast.
pub fn record_wallet_rejection() {
    counter!("wallet_rejections_total").increment(1);
}

/// Record a discarded out-of-date result.
///
/// # Arguments
/// * `kind` - "balance", "simulation", "signature" or "confirmation"
pub fn record_stale_result(kind: &str) {
    counter!("stale_results_discarded_total", "kind" => kind.to_string()).increment(1);
}

/// Record how long a confirmation took.
pub fn record_confirmation_duration(duration_secs: f64) {
    histogram!("confirmation_duration_seconds").record(duration_secs);
}

/// A timer that records confirmation duration when dropped.
pub struct ConfirmationTimer {
    start: Instant,
}

impl ConfirmationTimer {
    /// Start a new confirmation timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for ConfirmationTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConfirmationTimer {
    fn drop(&mut self) {
        record_confirmation_duration(self.start.elapsed().as_secs_f64());
    }
}
