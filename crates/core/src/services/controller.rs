//! Transfer controller - drives the state machine against the ports.
//!
//! The controller owns one [`TransferMachine`] and runs the effects it
//! requests as tasks. Completed tasks come back as events, applied one at
//! a time in the order they resolve.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{ControllerResult, WalletError};
use crate::metrics::{
    record_stale_result, record_transfer_finalized, record_transfer_submitted,
    record_wallet_rejection,
};
use crate::models::{Address, Field};
use crate::ports::{ChainClient, WalletConnector};

use super::confirmation::{ConfirmationConfig, ConfirmationTracker};
use super::ledger::HistoryLedger;
use super::machine::{ControllerState, Effect, Event, Snapshot, TransferMachine, Transition};
use super::simulation::SimulationGate;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the transfer controller.
#[derive(Debug, Clone, Default)]
pub struct ControllerConfig {
    /// Token contract pre-filled in the form.
    pub default_token: Option<Address>,
    /// Block explorer base used for transaction links.
    pub explorer_url: Option<String>,
    /// Confirmation polling.
    pub confirmation: ConfirmationConfig,
}

// =============================================================================
// TransferController
// =============================================================================

/// Async driver for one transfer form.
///
/// # Flow
///
/// 1. An action (or a completed task) becomes an [`Event`]
/// 2. The machine transitions and lists the effects to run
/// 3. Each effect is spawned; its result becomes the next event
/// 4. A fresh [`Snapshot`] is published
///
/// Nothing is retried here. Stale results are dropped by the machine.
pub struct TransferController<C, W>
where
    C: ChainClient + 'static,
    W: WalletConnector + 'static,
{
    config: ControllerConfig,
    chain: Arc<C>,
    wallet: Arc<W>,
    gate: SimulationGate<C>,
    tracker: ConfirmationTracker<C>,
    machine: TransferMachine,
    tasks: JoinSet<Event>,
    snapshots: watch::Sender<Snapshot>,
}

impl<C, W> TransferController<C, W>
where
    C: ChainClient + 'static,
    W: WalletConnector + 'static,
{
    pub fn new(config: ControllerConfig, chain: Arc<C>, wallet: Arc<W>) -> Self {
        let machine = TransferMachine::new(config.default_token);
        let (snapshots, _) = watch::channel(machine.snapshot());
        Self {
            gate: SimulationGate::new(chain.clone()),
            tracker: ConfirmationTracker::new(chain.clone(), config.confirmation.clone()),
            config,
            chain,
            wallet,
            machine,
            tasks: JoinSet::new(),
            snapshots,
        }
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Ask the wallet for its account and adopt it.
    pub async fn connect(&mut self) -> ControllerResult<Option<Address>> {
        let account = self.wallet.get_account().await?;
        match account {
            Some(address) => info!(account = %address, "🔌 Wallet connected"),
            None => warn!("⚠️  Wallet has no account"),
        }
        self.dispatch(Event::AccountChanged(account))?;
        Ok(account)
    }

    /// The wallet switched account (or disconnected).
    pub fn account_changed(&mut self, account: Option<Address>) {
        // Account changes are never refused.
        let _ = self.dispatch(Event::AccountChanged(account));
    }

    /// Edit one form field.
    pub fn update_field(&mut self, field: Field, value: impl Into<String>) -> ControllerResult<()> {
        self.dispatch(Event::FieldEdited {
            field,
            value: value.into(),
        })
    }

    /// Send the simulated call to the wallet.
    pub fn submit(&mut self) -> ControllerResult<()> {
        self.dispatch(Event::Submit)
    }

    /// Clear the form. History is untouched and a broadcast transaction
    /// keeps being observed.
    pub fn reset(&mut self) {
        let _ = self.dispatch(Event::Reset);
    }

    /// Re-fetch the balance, then re-validate and re-simulate.
    pub fn refresh(&mut self) -> ControllerResult<()> {
        self.dispatch(Event::Refresh)
    }

    // -------------------------------------------------------------------------
    // Driving
    // -------------------------------------------------------------------------

    /// Apply the next completed task. Returns `false` when nothing is running.
    pub async fn next_event(&mut self) -> bool {
        match self.tasks.join_next().await {
            Some(Ok(event)) => {
                let _ = self.dispatch(event);
                true
            }
            Some(Err(e)) => {
                error!(error = %e, "❌ Controller task failed");
                true
            }
            None => false,
        }
    }

    /// Run until every outstanding task has completed.
    pub async fn settle(&mut self) {
        while self.next_event().await {}
    }

    /// Number of tasks still running.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Snapshots published after every transition.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        self.machine.state()
    }

    pub fn history(&self) -> &HistoryLedger {
        self.machine.history()
    }

    pub fn machine(&self) -> &TransferMachine {
        &self.machine
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn dispatch(&mut self, event: Event) -> ControllerResult<()> {
        let before = self.machine.state();
        let recorded = self.machine.history().len();

        let Transition {
            next,
            effects,
            outcome,
            discarded,
        } = std::mem::take(&mut self.machine).transition(event);
        self.machine = next;

        if let Some(kind) = discarded {
            debug!(kind, "Discarded out-of-date result");
            record_stale_result(kind);
        }
        if let Err(e) = &outcome {
            debug!(error = %e, state = %before, "Action refused");
        }

        let after = self.machine.state();
        if before != after {
            debug!(from = %before, to = %after, "State transition");
        }

        if self.machine.history().len() > recorded
            && let Some(record) = self.machine.history().latest()
        {
            record_transfer_finalized(record.status.as_str());
            let link = self
                .config
                .explorer_url
                .as_deref()
                .and_then(|base| record.explorer_url(base));
            info!(
                status = record.status.as_str(),
                amount = %record.amount,
                symbol = %record.symbol,
                link = link.as_deref().unwrap_or("-"),
                "📝 Transfer recorded"
            );
        }

        for effect in effects {
            self.spawn(effect);
        }

        self.snapshots.send_replace(self.machine.snapshot());
        outcome
    }

    fn spawn(&mut self, effect: Effect) {
        match effect {
            Effect::FetchBalance {
                epoch,
                owner,
                token,
            } => {
                debug!(epoch, token = %token, "Fetching balance");
                let chain = self.chain.clone();
                self.tasks.spawn(async move {
                    let result = chain.get_balance(&owner, Some(&token)).await;
                    if let Err(e) = &result {
                        warn!(token = %token, error = %e, "⚠️  Balance lookup failed");
                    }
                    Event::BalanceLoaded { epoch, result }
                });
            }
            Effect::FetchNativeBalance { epoch, owner } => {
                let chain = self.chain.clone();
                self.tasks.spawn(async move {
                    let result = chain.get_balance(&owner, None).await;
                    match &result {
                        Ok(balance) => {
                            debug!(account = %owner, balance = %balance.formatted(), "Native balance loaded")
                        }
                        Err(e) => warn!(account = %owner, error = %e, "⚠️  Native balance lookup failed"),
                    }
                    Event::NativeBalanceLoaded { epoch, result }
                });
            }
            Effect::Simulate { generation, call } => {
                let gate = self.gate.clone();
                self.tasks.spawn(async move {
                    let result = gate.simulate(generation, &call).await;
                    Event::SimulationFinished { generation, result }
                });
            }
            Effect::SignAndSend { attempt, call } => {
                info!(%attempt, to = %call.to, "✍️  Requesting wallet signature");
                record_transfer_submitted();
                let wallet = self.wallet.clone();
                self.tasks.spawn(async move {
                    let result = wallet.sign_and_send(&call).await;
                    match &result {
                        Ok(tx_hash) => info!(%attempt, %tx_hash, "📡 Transaction broadcast"),
                        Err(WalletError::UserRejected) => {
                            info!(%attempt, "🚫 Signature rejected by user");
                            record_wallet_rejection();
                        }
                        Err(e) => {
                            warn!(%attempt, error = %e, "⚠️  Wallet failed to send");
                            record_wallet_rejection();
                        }
                    }
                    Event::SignatureResolved { attempt, result }
                });
            }
            Effect::TrackConfirmation { attempt, tx_hash } => {
                let tracker = self.tracker.clone();
                self.tasks.spawn(async move {
                    let outcome = tracker.track(&tx_hash).await;
                    Event::ConfirmationResolved {
                        attempt,
                        outcome,
                        at: Utc::now(),
                    }
                });
            }
        }
    }
}
