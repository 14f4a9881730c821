//! Confirmation tracker: observes a broadcast transaction until it is final.
//!
//! A missing receipt means "not mined yet" and is polled again. A network
//! failure is waited out with exponential backoff. Anything else, or the
//! optional timeout, ends observation with [`ConfirmationOutcome::Failed`],
//! which is kept apart from an on-chain revert.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::error::ChainError;
use crate::metrics::ConfirmationTimer;
use crate::models::{Receipt, TxHash};
use crate::ports::ChainClient;

/// Polling behaviour of the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationConfig {
    /// Delay between receipt lookups while the transaction is not mined.
    pub poll_interval: Duration,
    /// Upper bound for the backoff applied on network failures.
    pub max_backoff: Duration,
    /// Give up after this long. `None` observes until a receipt arrives.
    pub timeout: Option<Duration>,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            timeout: None,
        }
    }
}

/// Terminal result of observing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Included and successful.
    Confirmed(Receipt),
    /// Included and reverted.
    Reverted(Receipt),
    /// Could not be observed; carries the reason.
    Failed(String),
}

impl ConfirmationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConfirmationOutcome::Confirmed(_))
    }
}

/// Observes transactions through the chain client.
pub struct ConfirmationTracker<C: ChainClient> {
    chain: Arc<C>,
    config: ConfirmationConfig,
}

impl<C: ChainClient> Clone for ConfirmationTracker<C> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: ChainClient> ConfirmationTracker<C> {
    pub fn new(chain: Arc<C>, config: ConfirmationConfig) -> Self {
        Self { chain, config }
    }

    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }

    /// Observe `tx_hash` until it reaches a terminal outcome.
    #[instrument(skip_all, fields(tx_hash = %tx_hash))]
    pub async fn track(&self, tx_hash: &TxHash) -> ConfirmationOutcome {
        let _timer = ConfirmationTimer::new();
        let started = Instant::now();
        let mut backoff = self.config.poll_interval;

        loop {
            let delay = match self.chain.wait_for_receipt(tx_hash).await {
                Ok(receipt) if receipt.success => {
                    info!(block = ?receipt.block_number, "✅ Transaction confirmed");
                    return ConfirmationOutcome::Confirmed(receipt);
                }
                Ok(receipt) => {
                    warn!(block = ?receipt.block_number, "❌ Transaction reverted");
                    return ConfirmationOutcome::Reverted(receipt);
                }
                Err(ChainError::NotFound(_)) => {
                    debug!("Receipt not available yet");
                    backoff = self.config.poll_interval;
                    self.config.poll_interval
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, retry_in = ?backoff, "⚠️  Receipt lookup failed, will retry");
                    let delay = backoff;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                    delay
                }
                Err(e) => {
                    warn!(error = %e, "❌ Unable to observe transaction");
                    return ConfirmationOutcome::Failed(e.to_string());
                }
            };

            if let Some(timeout) = self.config.timeout
                && started.elapsed() >= timeout
            {
                warn!(timeout = ?timeout, "❌ Confirmation timed out");
                return ConfirmationOutcome::Failed(format!(
                    "no receipt after {}s",
                    timeout.as_secs()
                ));
            }

            sleep(delay).await;
        }
    }
}
