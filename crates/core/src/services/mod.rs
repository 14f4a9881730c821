//! Transfer lifecycle services.
//!
//! - [`validator`] - InputValidator: field validation
//! - [`simulation`] - SimulationGate: dry-run before signing
//! - [`confirmation`] - ConfirmationTracker: observe a broadcast transaction
//! - [`ledger`] - HistoryLedger: append-only outcome history
//! - [`machine`] - Pure transition function over events
//! - [`controller`] - Async driver running the machine's effects

pub mod confirmation;
pub mod controller;
pub mod ledger;
pub mod machine;
pub mod simulation;
pub mod validator;

pub use confirmation::{ConfirmationConfig, ConfirmationOutcome, ConfirmationTracker};
pub use controller::{ControllerConfig, TransferController};
pub use ledger::HistoryLedger;
pub use machine::{
    Attempt, AttemptId, ControllerState, Effect, Event, Failure, Snapshot, TransferMachine,
    Transition,
};
pub use simulation::{SimulationGate, SimulationState, prepare};
pub use validator::{ValidationState, dependents, is_submittable, validate_field};
