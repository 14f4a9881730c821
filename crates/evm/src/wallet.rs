//! Wallet connector backed by a node-managed account.
//!
//! Signing is delegated to the node (`eth_sendTransaction`), as with a
//! local dev node or a signer proxy. An EIP-1193 rejection (code 4001)
//! maps to [`WalletError::UserRejected`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument};

use courier_core::error::{ChainError, WalletError, WalletResult};
use courier_core::models::{Address, CallDescriptor, TxHash};
use courier_core::ports::WalletConnector;

use crate::client::TxObject;
use crate::rpc::RpcTransport;

/// EIP-1193 "user rejected request".
const USER_REJECTED_CODE: i64 = 4001;

/// Wallet connector implementing the WalletConnector port over JSON-RPC.
pub struct EvmWallet {
    rpc: Arc<RpcTransport>,
    sender: Option<Address>,
}

impl EvmWallet {
    pub(crate) fn new(rpc: Arc<RpcTransport>, sender: Option<Address>) -> Self {
        Self { rpc, sender }
    }
}

fn into_wallet_error(err: ChainError) -> WalletError {
    match err {
        ChainError::Rpc {
            code: USER_REJECTED_CODE,
            ..
        } => WalletError::UserRejected,
        other => WalletError::Connector(other.to_string()),
    }
}

#[async_trait]
impl WalletConnector for EvmWallet {
    async fn get_account(&self) -> WalletResult<Option<Address>> {
        if let Some(sender) = self.sender {
            return Ok(Some(sender));
        }

        let accounts: Vec<String> = self
            .rpc
            .call("eth_accounts", json!([]))
            .await
            .map_err(into_wallet_error)?
            .unwrap_or_default();

        accounts
            .first()
            .map(|a| {
                a.parse::<Address>()
                    .map_err(|e| WalletError::Connector(format!("node returned bad account {a}: {e}")))
            })
            .transpose()
    }

    #[instrument(skip_all, fields(from = %call.from, to = %call.to))]
    async fn sign_and_send(&self, call: &CallDescriptor) -> WalletResult<TxHash> {
        debug!(gas = ?call.gas, "Sending transaction");
        let hash: String = self
            .rpc
            .call_required("eth_sendTransaction", json!([TxObject::from(call)]))
            .await
            .map_err(into_wallet_error)?;

        hash.parse::<TxHash>()
            .map_err(|e| WalletError::Connector(format!("bad transaction hash {hash}: {e}")))
    }
}
