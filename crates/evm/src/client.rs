//! Chain client over Ethereum JSON-RPC.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use courier_core::error::{ChainError, ChainResult, SimulationError};
use courier_core::models::{Address, CallDescriptor, Receipt, TokenBalance, TxHash, U256};
use courier_core::ports::ChainClient;

use crate::abi;
use crate::config::EvmClientConfig;
use crate::rpc::RpcTransport;
use crate::wallet::EvmWallet;

/// Geth's error code for a reverted call.
const REVERT_CODE: i64 = 3;

/// Transaction object as sent to `eth_call`, `eth_estimateGas` and
/// `eth_sendTransaction`.
#[derive(Debug, Serialize)]
pub(crate) struct TxObject {
    from: Address,
    to: Address,
    data: String,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas: Option<String>,
}

impl From<&CallDescriptor> for TxObject {
    fn from(call: &CallDescriptor) -> Self {
        Self {
            from: call.from,
            to: call.to,
            data: call.data_hex(),
            value: abi::to_quantity(call.value),
            gas: call.gas.map(|g| abi::to_quantity(U256::from(g))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptJson {
    status: Option<String>,
    block_number: Option<String>,
    gas_used: Option<String>,
}

/// JSON-RPC adapter implementing the ChainClient port.
pub struct EvmClient {
    rpc: Arc<RpcTransport>,
    config: EvmClientConfig,
}

impl EvmClient {
    /// Build a client for `config.rpc_url`. No request is made yet.
    #[instrument(skip_all, fields(url = %config.rpc_url))]
    pub fn new(config: EvmClientConfig) -> ChainResult<Self> {
        debug!("Creating JSON-RPC client");
        let rpc = Arc::new(RpcTransport::new(&config)?);
        Ok(Self { rpc, config })
    }

    /// Wallet connector sharing this client's connection.
    ///
    /// With `sender` set, that account is used instead of `eth_accounts`.
    pub fn wallet(&self, sender: Option<Address>) -> EvmWallet {
        EvmWallet::new(self.rpc.clone(), sender)
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> ChainResult<u64> {
        let id: String = self.rpc.call_required("eth_chainId", json!([])).await?;
        abi::parse_u64_quantity(&id)
    }

    async fn eth_call(&self, to: &Address, data: Vec<u8>) -> ChainResult<Vec<u8>> {
        let output: String = self
            .rpc
            .call_required(
                "eth_call",
                json!([{ "to": to, "data": format!("0x{}", hex::encode(data)) }, "latest"]),
            )
            .await?;
        abi::parse_bytes(&output)
    }
}

/// Reason of a reverted call, if `err` is one.
fn revert_reason(err: &ChainError) -> Option<String> {
    let ChainError::Rpc { code, message } = err else {
        return None;
    };
    if *code != REVERT_CODE && !message.starts_with("execution reverted") {
        return None;
    }
    let reason = message
        .strip_prefix("execution reverted: ")
        .unwrap_or(message);
    Some(reason.to_string())
}

fn into_simulation_error(err: ChainError) -> SimulationError {
    match revert_reason(&err) {
        Some(reason) => SimulationError::Reverted(reason),
        None => SimulationError::Chain(err),
    }
}

#[async_trait]
impl ChainClient for EvmClient {
    #[instrument(skip_all, fields(owner = %owner))]
    async fn get_balance(&self, owner: &Address, token: Option<&Address>) -> ChainResult<TokenBalance> {
        let Some(token) = token else {
            let value: String = self
                .rpc
                .call_required("eth_getBalance", json!([owner, "latest"]))
                .await?;
            return Ok(TokenBalance {
                value: abi::parse_quantity(&value)?,
                decimals: 18,
                symbol: self.config.native_symbol.clone(),
                name: None,
            });
        };

        let value = abi::decode_u256(&self.eth_call(token, abi::balance_of(owner)).await?)?;
        let decimals = abi::decode_u8(&self.eth_call(token, abi::DECIMALS_SELECTOR.to_vec()).await?)?;
        let symbol =
            abi::decode_string(&self.eth_call(token, abi::SYMBOL_SELECTOR.to_vec()).await?)?;

        // name() is optional in ERC-20; its absence does not fail the lookup.
        let name = match self.eth_call(token, abi::NAME_SELECTOR.to_vec()).await {
            Ok(data) => abi::decode_string(&data).ok(),
            Err(e) => {
                warn!(token = %token, error = %e, "Token name unavailable");
                None
            }
        };

        debug!(token = %token, %value, decimals, symbol = %symbol, "Balance loaded");
        Ok(TokenBalance {
            value,
            decimals,
            symbol,
            name,
        })
    }

    #[instrument(skip_all, fields(to = %call.to))]
    async fn simulate(&self, call: &CallDescriptor) -> Result<CallDescriptor, SimulationError> {
        let tx = TxObject::from(call);

        let _: String = self
            .rpc
            .call_required("eth_call", json!([tx, "latest"]))
            .await
            .map_err(into_simulation_error)?;

        let gas: String = self
            .rpc
            .call_required("eth_estimateGas", json!([tx]))
            .await
            .map_err(into_simulation_error)?;
        let gas = abi::parse_u64_quantity(&gas)?;

        debug!(gas, "Dry-run succeeded");
        Ok(CallDescriptor {
            gas: Some(gas),
            ..call.clone()
        })
    }

    #[instrument(skip_all, fields(tx_hash = %tx_hash))]
    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> ChainResult<Receipt> {
        let receipt: ReceiptJson = self
            .rpc
            .call("eth_getTransactionReceipt", json!([tx_hash]))
            .await?
            .ok_or_else(|| ChainError::NotFound(format!("receipt for {tx_hash}")))?;

        let quantity = |q: Option<String>| -> ChainResult<Option<u64>> {
            q.as_deref().map(abi::parse_u64_quantity).transpose()
        };

        Ok(Receipt {
            success: receipt.status.as_deref() == Some("0x1"),
            block_number: quantity(receipt.block_number)?,
            gas_used: quantity(receipt.gas_used)?,
        })
    }
}
