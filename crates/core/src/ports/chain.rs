//! Port trait for the chain client.
//!
//! This trait defines the read and dry-run interface the transfer
//! controller needs from a node. Implementations live in the
//! infrastructure layer (e.g., `courier-evm`).

use async_trait::async_trait;

use crate::error::{ChainResult, SimulationError};
use crate::models::{Address, CallDescriptor, Receipt, TokenBalance, TxHash};

/// Port trait for blockchain reads and dry-runs.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Balance of `owner` in `token`, with the token's decimals and symbol.
    ///
    /// `None` queries the chain's native coin.
    async fn get_balance(&self, owner: &Address, token: Option<&Address>)
    -> ChainResult<TokenBalance>;

    /// Execute `call` against current state without broadcasting.
    ///
    /// On success, returns the executable descriptor (gas filled in) to be
    /// handed to the wallet unchanged.
    async fn simulate(&self, call: &CallDescriptor) -> Result<CallDescriptor, SimulationError>;

    /// Receipt of a broadcast transaction.
    ///
    /// Returns [`crate::error::ChainError::NotFound`] while the transaction
    /// is not included yet.
    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> ChainResult<Receipt>;
}
