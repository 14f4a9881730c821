//! Port trait for the wallet connector.

use async_trait::async_trait;

use crate::error::WalletResult;
use crate::models::{Address, CallDescriptor, TxHash};

/// Port trait for an account holder able to sign and broadcast.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Currently connected account, `None` when disconnected.
    async fn get_account(&self) -> WalletResult<Option<Address>>;

    /// Sign `call` and broadcast it, returning the transaction hash.
    ///
    /// Fails with [`crate::error::WalletError::UserRejected`] when the
    /// user declines.
    async fn sign_and_send(&self, call: &CallDescriptor) -> WalletResult<TxHash>;
}
