//! Transfer lifecycle state machine.
//!
//! [`TransferMachine::transition`] is a pure function of the current
//! machine and one [`Event`]. It returns the next machine and the
//! [`Effect`]s the driver must run; effect results come back as events.
//!
//! # Staleness
//!
//! Every asynchronous result carries the tag of the request that issued it:
//!
//! - balance lookups carry a balance epoch, bumped on every refetch
//!   (token and native coin keep separate epochs)
//! - simulations carry a generation, bumped on every input change
//! - signatures and receipts carry an [`AttemptId`]
//!
//! A result whose tag no longer matches is discarded, never applied.
//!
//! # Attempts
//!
//! At most one attempt is attached to the form. A reset (or an account
//! switch) detaches it: the form is cleared but the attempt is still
//! observed, and its terminal outcome is still recorded exactly once.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{
    ChainResult, ControllerError, ControllerResult, SimulationError, WalletError, WalletResult,
};
use crate::models::{
    Address, CallDescriptor, Field, FormFields, TokenBalance, TokenStatus, TransactionRecord,
    TransferRequest, TransferStatus, TxHash, parse_address,
};

use super::confirmation::ConfirmationOutcome;
use super::ledger::HistoryLedger;
use super::simulation::{SimulationState, prepare};
use super::validator::{ValidationState, dependents};

// =============================================================================
// States
// =============================================================================

/// Lifecycle state surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ControllerState {
    #[default]
    Idle,
    Validating,
    SimulationPending,
    SimulationReady,
    SimulationFailed,
    AwaitingWalletSignature,
    AwaitingChainConfirmation,
    Confirmed,
    Reverted,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "Idle",
            ControllerState::Validating => "Validating",
            ControllerState::SimulationPending => "SimulationPending",
            ControllerState::SimulationReady => "SimulationReady",
            ControllerState::SimulationFailed => "SimulationFailed",
            ControllerState::AwaitingWalletSignature => "AwaitingWalletSignature",
            ControllerState::AwaitingChainConfirmation => "AwaitingChainConfirmation",
            ControllerState::Confirmed => "Confirmed",
            ControllerState::Reverted => "Reverted",
        }
    }

    /// The attempt reached its end.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerState::Confirmed | ControllerState::Reverted)
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttemptId(pub u64);

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A submitted transfer awaiting its signature or receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub id: AttemptId,
    pub request: TransferRequest,
    pub symbol: String,
    pub call: CallDescriptor,
    /// Set once the wallet broadcast it.
    pub tx_hash: Option<TxHash>,
    /// Whether the form still shows this attempt.
    pub attached: bool,
}

/// Error currently surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// Dry-run failed; the reason is shown verbatim.
    #[error("{0}")]
    Simulation(String),

    /// The wallet declined or failed to sign.
    #[error("{0}")]
    Wallet(WalletError),

    /// Included on chain but reverted.
    #[error("Transaction reverted")]
    Reverted,

    /// The transaction could not be observed to a final receipt.
    #[error("Confirmation failed: {0}")]
    ConfirmationFailed(String),
}

// =============================================================================
// Events and Effects
// =============================================================================

/// Input to the machine: user actions and completed effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    FieldEdited { field: Field, value: String },
    AccountChanged(Option<Address>),
    BalanceLoaded {
        epoch: u64,
        result: ChainResult<TokenBalance>,
    },
    NativeBalanceLoaded {
        epoch: u64,
        result: ChainResult<TokenBalance>,
    },
    SimulationFinished {
        generation: u64,
        result: Result<CallDescriptor, SimulationError>,
    },
    Submit,
    SignatureResolved {
        attempt: AttemptId,
        result: WalletResult<TxHash>,
    },
    ConfirmationResolved {
        attempt: AttemptId,
        outcome: ConfirmationOutcome,
        at: DateTime<Utc>,
    },
    Refresh,
    Reset,
}

/// Asynchronous work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchBalance {
        epoch: u64,
        owner: Address,
        token: Address,
    },
    FetchNativeBalance {
        epoch: u64,
        owner: Address,
    },
    Simulate {
        generation: u64,
        call: CallDescriptor,
    },
    SignAndSend {
        attempt: AttemptId,
        call: CallDescriptor,
    },
    TrackConfirmation {
        attempt: AttemptId,
        tx_hash: TxHash,
    },
}

/// Result of applying one event.
#[derive(Debug)]
pub struct Transition {
    pub next: TransferMachine,
    pub effects: Vec<Effect>,
    /// `Err` when a user action was refused; the machine is then unchanged.
    pub outcome: ControllerResult<()>,
    /// Kind of result dropped as out of date, if any.
    pub discarded: Option<&'static str>,
}

#[derive(Default)]
struct Step {
    effects: Vec<Effect>,
    discarded: Option<&'static str>,
}

// =============================================================================
// Machine
// =============================================================================

/// Complete controller state.
#[derive(Debug, Clone, Default)]
pub struct TransferMachine {
    default_token: Option<Address>,
    account: Option<Address>,
    form: FormFields,
    validation: ValidationState,
    token: TokenStatus,
    native: TokenStatus,
    simulation: SimulationState,
    state: ControllerState,
    generation: u64,
    balance_epoch: u64,
    native_epoch: u64,
    attempt_seq: u64,
    attempts: Vec<Attempt>,
    failure: Option<Failure>,
    tx_hash: Option<TxHash>,
    history: HistoryLedger,
}

impl TransferMachine {
    /// Fresh machine; `default_token` pre-fills the token field.
    pub fn new(default_token: Option<Address>) -> Self {
        let mut machine = Self {
            default_token,
            ..Default::default()
        };
        machine.form = machine.initial_form();
        machine
    }

    /// Apply one event.
    pub fn transition(mut self, event: Event) -> Transition {
        let mut step = Step::default();
        let outcome = match event {
            Event::FieldEdited { field, value } => self.on_field_edited(field, value, &mut step),
            Event::AccountChanged(account) => {
                self.on_account_changed(account, &mut step);
                Ok(())
            }
            Event::BalanceLoaded { epoch, result } => {
                self.on_balance_loaded(epoch, result, &mut step);
                Ok(())
            }
            Event::NativeBalanceLoaded { epoch, result } => {
                self.on_native_balance_loaded(epoch, result, &mut step);
                Ok(())
            }
            Event::SimulationFinished { generation, result } => {
                self.on_simulation_finished(generation, result, &mut step);
                Ok(())
            }
            Event::Submit => self.on_submit(&mut step),
            Event::SignatureResolved { attempt, result } => {
                self.on_signature_resolved(attempt, result, &mut step);
                Ok(())
            }
            Event::ConfirmationResolved {
                attempt,
                outcome,
                at,
            } => {
                self.on_confirmation_resolved(attempt, outcome, at, &mut step);
                Ok(())
            }
            Event::Refresh => self.on_refresh(&mut step),
            Event::Reset => {
                self.clear_form(&mut step);
                Ok(())
            }
        };

        Transition {
            next: self,
            effects: step.effects,
            outcome,
            discarded: step.discarded,
        }
    }

    // -------------------------------------------------------------------------
    // Handlers
    // -------------------------------------------------------------------------

    fn on_field_edited(&mut self, field: Field, value: String, step: &mut Step) -> ControllerResult<()> {
        if self.attached().is_some() {
            return Err(ControllerError::AttemptInProgress);
        }
        if self.form.get(field) == value {
            return Ok(());
        }

        self.form.set(field, value);
        self.tx_hash = None;
        if field == Field::TokenAddress {
            self.refetch_balance(step);
        }
        self.validation
            .revalidate(dependents(field), &self.form, &self.token);
        self.reevaluate(step);
        Ok(())
    }

    fn on_account_changed(&mut self, account: Option<Address>, step: &mut Step) {
        if account == self.account {
            return;
        }
        let switching = self.account.is_some();
        self.account = account;
        self.refetch_native(step);

        if account.is_none() || (switching && self.attached().is_some()) {
            self.clear_form(step);
            return;
        }

        self.refetch_balance(step);
        self.validation
            .revalidate(dependents(Field::TokenAddress), &self.form, &self.token);
        self.reevaluate(step);
    }

    fn on_balance_loaded(&mut self, epoch: u64, result: ChainResult<TokenBalance>, step: &mut Step) {
        if epoch != self.balance_epoch {
            step.discarded = Some("balance");
            return;
        }

        self.token = match result {
            Ok(balance) => TokenStatus::Loaded(balance),
            Err(e) => TokenStatus::Failed {
                reason: e.to_string(),
            },
        };
        self.validation
            .revalidate(dependents(Field::TokenAddress), &self.form, &self.token);

        if self.attached().is_none() && !self.state.is_terminal() {
            self.reevaluate(step);
        }
    }

    fn on_native_balance_loaded(
        &mut self,
        epoch: u64,
        result: ChainResult<TokenBalance>,
        step: &mut Step,
    ) {
        if epoch != self.native_epoch {
            step.discarded = Some("native_balance");
            return;
        }
        self.native = match result {
            Ok(balance) => TokenStatus::Loaded(balance),
            Err(e) => TokenStatus::Failed {
                reason: e.to_string(),
            },
        };
    }

    fn on_simulation_finished(
        &mut self,
        generation: u64,
        result: Result<CallDescriptor, SimulationError>,
        step: &mut Step,
    ) {
        let current = matches!(
            self.simulation,
            SimulationState::Pending { generation: g, .. } if g == generation
        );
        if generation != self.generation || !current {
            step.discarded = Some("simulation");
            return;
        }

        let SimulationState::Pending { request, .. } = std::mem::take(&mut self.simulation) else {
            return;
        };
        match result {
            Ok(call) => {
                self.simulation = SimulationState::Ready {
                    generation,
                    request,
                    call,
                };
                self.state = ControllerState::SimulationReady;
            }
            Err(e) => {
                let reason = e.to_string();
                self.failure = Some(Failure::Simulation(reason.clone()));
                self.simulation = SimulationState::Failed {
                    generation,
                    request,
                    reason,
                };
                self.state = ControllerState::SimulationFailed;
            }
        }
    }

    fn on_submit(&mut self, step: &mut Step) -> ControllerResult<()> {
        if !self.attempts.is_empty() {
            return Err(ControllerError::AttemptInProgress);
        }
        if self.state != ControllerState::SimulationReady {
            return Err(ControllerError::NotReady(self.state.to_string()));
        }
        let account = self.account.ok_or(ControllerError::NoAccount)?;

        let SimulationState::Ready {
            generation,
            request,
            call,
        } = &self.simulation
        else {
            return Err(ControllerError::StaleSimulation);
        };
        let current = prepare(&self.form, &self.validation, &self.token, Some(account));
        let matches_current = current.is_some_and(|(current, _)| current == *request);
        if *generation != self.generation || !matches_current || call.from != account {
            return Err(ControllerError::StaleSimulation);
        }

        self.attempt_seq += 1;
        let id = AttemptId(self.attempt_seq);
        let call = call.clone();
        self.attempts.push(Attempt {
            id,
            request: request.clone(),
            symbol: self
                .token
                .balance()
                .map(|b| b.symbol.clone())
                .unwrap_or_default(),
            call: call.clone(),
            tx_hash: None,
            attached: true,
        });
        self.state = ControllerState::AwaitingWalletSignature;
        self.failure = None;
        self.tx_hash = None;
        step.effects.push(Effect::SignAndSend { attempt: id, call });
        Ok(())
    }

    fn on_signature_resolved(&mut self, id: AttemptId, result: WalletResult<TxHash>, step: &mut Step) {
        let Some(index) = self
            .attempts
            .iter()
            .position(|a| a.id == id && a.tx_hash.is_none())
        else {
            step.discarded = Some("signature");
            return;
        };

        match result {
            Ok(tx_hash) => {
                let attempt = &mut self.attempts[index];
                attempt.tx_hash = Some(tx_hash);
                if attempt.attached {
                    self.state = ControllerState::AwaitingChainConfirmation;
                    self.tx_hash = Some(tx_hash);
                }
                step.effects.push(Effect::TrackConfirmation { attempt: id, tx_hash });
            }
            Err(e) => {
                let attempt = self.attempts.remove(index);
                if attempt.attached {
                    // Inputs are frozen while attached, so the simulation still holds.
                    self.state = ControllerState::SimulationReady;
                    self.failure = Some(Failure::Wallet(e));
                }
            }
        }
    }

    fn on_confirmation_resolved(
        &mut self,
        id: AttemptId,
        outcome: ConfirmationOutcome,
        at: DateTime<Utc>,
        step: &mut Step,
    ) {
        let Some(index) = self
            .attempts
            .iter()
            .position(|a| a.id == id && a.tx_hash.is_some())
        else {
            step.discarded = Some("confirmation");
            return;
        };
        let attempt = self.attempts.remove(index);
        let mined = !matches!(outcome, ConfirmationOutcome::Failed(_));

        let status = if outcome.is_success() {
            TransferStatus::Success
        } else {
            TransferStatus::Error
        };
        self.history.append(TransactionRecord {
            token_address: attempt.request.token_address,
            recipient: attempt.request.recipient,
            amount: attempt.request.amount.to_string(),
            symbol: attempt.symbol,
            tx_hash: attempt.tx_hash,
            status,
            timestamp: at,
        });

        if attempt.attached {
            self.simulation = SimulationState::Idle;
            (self.state, self.failure) = match outcome {
                ConfirmationOutcome::Confirmed(_) => (ControllerState::Confirmed, None),
                ConfirmationOutcome::Reverted(_) => (ControllerState::Reverted, Some(Failure::Reverted)),
                ConfirmationOutcome::Failed(reason) => (
                    ControllerState::Reverted,
                    Some(Failure::ConfirmationFailed(reason)),
                ),
            };
        }

        // Funds moved: the shown balance is out of date.
        if status == TransferStatus::Success
            && parse_address(&self.form.token_address).ok() == Some(attempt.request.token_address)
        {
            self.refetch_balance(step);
            self.validation
                .revalidate(dependents(Field::TokenAddress), &self.form, &self.token);
        }
        // Gas was paid, reverted or not.
        if mined && self.account == Some(attempt.call.from) {
            self.refetch_native(step);
        }
    }

    fn on_refresh(&mut self, step: &mut Step) -> ControllerResult<()> {
        if self.attached().is_some() {
            return Err(ControllerError::AttemptInProgress);
        }
        self.tx_hash = None;
        self.refetch_native(step);
        self.refetch_balance(step);
        self.validation
            .revalidate(dependents(Field::TokenAddress), &self.form, &self.token);
        self.reevaluate(step);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn initial_form(&self) -> FormFields {
        FormFields {
            token_address: self
                .default_token
                .map(|t| t.to_checksum(None))
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    fn attached(&self) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.attached)
    }

    /// Back to the initial form. History and detached attempts are kept.
    fn clear_form(&mut self, step: &mut Step) {
        for attempt in &mut self.attempts {
            attempt.attached = false;
        }
        self.form = self.initial_form();
        self.tx_hash = None;
        self.refetch_balance(step);
        self.validation = ValidationState::compute(&self.form, &self.token);
        self.reevaluate(step);
    }

    /// Start a new balance lookup for the token field, superseding any
    /// lookup in flight.
    fn refetch_balance(&mut self, step: &mut Step) {
        self.balance_epoch += 1;
        match (self.account, parse_address(&self.form.token_address)) {
            (Some(owner), Ok(token)) => {
                self.token = TokenStatus::Loading;
                step.effects.push(Effect::FetchBalance {
                    epoch: self.balance_epoch,
                    owner,
                    token,
                });
            }
            _ => self.token = TokenStatus::Unset,
        }
    }

    /// Start a new native-coin balance lookup for the account.
    fn refetch_native(&mut self, step: &mut Step) {
        self.native_epoch += 1;
        match self.account {
            Some(owner) => {
                self.native = TokenStatus::Loading;
                step.effects.push(Effect::FetchNativeBalance {
                    epoch: self.native_epoch,
                    owner,
                });
            }
            None => self.native = TokenStatus::Unset,
        }
    }

    /// Recompute the lifecycle state from the inputs, superseding any
    /// simulation in flight.
    fn reevaluate(&mut self, step: &mut Step) {
        self.generation += 1;
        self.simulation = SimulationState::Idle;
        self.failure = None;

        // An untouched form is idle unless it already shows an error,
        // e.g. a default token that failed to load.
        if self.form == self.initial_form() && self.validation.is_clean() {
            self.state = ControllerState::Idle;
            return;
        }

        match prepare(&self.form, &self.validation, &self.token, self.account) {
            Some((request, call)) => {
                self.simulation = SimulationState::Pending {
                    generation: self.generation,
                    request,
                };
                self.state = ControllerState::SimulationPending;
                step.effects.push(Effect::Simulate {
                    generation: self.generation,
                    call,
                });
            }
            None => self.state = ControllerState::Validating,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn validation(&self) -> &ValidationState {
        &self.validation
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.simulation
    }

    pub fn token(&self) -> &TokenStatus {
        &self.token
    }

    /// Native-coin balance of the connected account.
    pub fn native(&self) -> &TokenStatus {
        &self.native
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    /// Current request generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Attempts not yet terminal, attached or not.
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Submit would be accepted.
    pub fn can_submit(&self) -> bool {
        self.state == ControllerState::SimulationReady && self.attempts.is_empty()
    }

    /// Read-only view for the presentation layer.
    pub fn snapshot(&self) -> Snapshot {
        let request = match self.attached() {
            Some(attempt) => Some(attempt.request.clone()),
            None => self.simulation.request().cloned(),
        };
        Snapshot {
            form: self.form.clone(),
            request,
            validation: self.validation.clone(),
            simulation: self.simulation.clone(),
            state: self.state,
            account: self.account,
            native_balance: self.native.clone(),
            token: self.token.clone(),
            tx_hash: self.tx_hash,
            error: self.failure.as_ref().map(ToString::to_string),
            can_submit: self.can_submit(),
            history: self.history.to_vec(),
        }
    }
}

/// What the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub form: FormFields,
    pub request: Option<TransferRequest>,
    pub validation: ValidationState,
    pub simulation: SimulationState,
    pub state: ControllerState,
    pub account: Option<Address>,
    /// Native-coin balance of `account`, for gas.
    pub native_balance: TokenStatus,
    pub token: TokenStatus,
    pub tx_hash: Option<TxHash>,
    pub error: Option<String>,
    pub can_submit: bool,
    /// Newest first.
    pub history: Vec<TransactionRecord>,
}
