//! Error types for the transfer domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ValidationError`] - Field-scoped input problems (rendered, never thrown)
//! - [`SimulationError`] - Dry-run failures that block submission
//! - [`WalletError`] - Wallet connector failures (rejection, disconnect)
//! - [`ChainError`] - Chain client RPC errors
//! - [`ControllerError`] - Refusals of presentation actions
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Parsing Errors
// =============================================================================

/// Address parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Missing `0x` prefix.
    #[error("address must start with 0x")]
    MissingPrefix,

    /// Body is not 40 characters long.
    #[error("address must be 40 hex digits, got {0}")]
    InvalidLength(usize),

    /// Body contains a non-hex character.
    #[error("address contains non-hex characters")]
    InvalidHex,

    /// Mixed-case body does not match its EIP-55 checksum.
    #[error("address checksum mismatch")]
    BadChecksum,
}

/// Decimal amount parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Not plain decimal notation.
    #[error("not a decimal number: {0}")]
    NotANumber(String),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Field-scoped validation failures.
///
/// The `Display` output is the message shown next to the offending field.
/// These never escape the controller as failures; they live in
/// [`crate::services::ValidationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Token field holds something that is not an address.
    #[error("invalid contract address")]
    InvalidContractAddress,

    /// Token metadata/balance lookup failed for a well-formed address.
    #[error("unable to load token info")]
    TokenUnavailable,

    /// Recipient field holds something that is not an address.
    #[error("invalid wallet address")]
    InvalidWalletAddress,

    /// Amount field is not a number.
    #[error("enter a valid number")]
    NotANumber,

    /// Amount is zero or negative.
    #[error("amount must be greater than zero")]
    NotPositive,

    /// Amount has more fractional digits than the token's decimals.
    #[error("too many decimal places")]
    TooPrecise,

    /// Amount exceeds the current balance.
    #[error("insufficient balance")]
    InsufficientBalance,
}

impl Serialize for ValidationError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Chain client errors.
///
/// These errors occur when talking to the node over JSON-RPC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Transport failure or node unreachable.
    #[error("Network error: {0}")]
    Network(String),

    /// Requested object does not exist (yet).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The node answered with a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },

    /// The node answered with something we cannot decode.
    #[error("Decoding error: {0}")]
    Decode(String),
}

impl ChainError {
    /// Whether an observer can wait this condition out.
    ///
    /// `NotFound` covers a receipt that is not mined yet, `Network` a node
    /// that is slow or briefly unreachable.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Network(_) | ChainError::NotFound(_))
    }
}

// =============================================================================
// Simulation Errors
// =============================================================================

/// Dry-run failures.
///
/// The reason is surfaced to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The call would revert.
    #[error("{0}")]
    Reverted(String),

    /// The dry-run itself could not be performed.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

// =============================================================================
// Wallet Errors
// =============================================================================

/// Wallet connector errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The user declined to sign.
    #[error("User rejected the request")]
    UserRejected,

    /// No account is connected.
    #[error("Wallet disconnected")]
    Disconnected,

    /// Any other connector failure.
    #[error("Connector error: {0}")]
    Connector(String),
}

// =============================================================================
// Controller Errors
// =============================================================================

/// Refusals of presentation-layer actions.
///
/// Returned by [`crate::services::TransferController`] actions when the
/// action is not allowed in the current state. State is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// Submit outside of `SimulationReady`.
    #[error("Transfer is not ready to submit (state: {0})")]
    NotReady(String),

    /// No simulated call descriptor matches the current request.
    #[error("No simulation result matches the current request")]
    StaleSimulation,

    /// An attempt is already awaiting signature or confirmation.
    #[error("A transfer is already in progress")]
    AttemptInProgress,

    /// No wallet account is connected.
    #[error("No wallet account connected")]
    NoAccount,

    /// Wallet failure while connecting.
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for chain client operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Result type for wallet connector operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Result type for controller actions.
pub type ControllerResult<T> = Result<T, ControllerError>;
