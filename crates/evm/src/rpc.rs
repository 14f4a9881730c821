//! Minimal JSON-RPC 2.0 transport over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use courier_core::error::{ChainError, ChainResult};

use crate::abi::decode_revert;
use crate::config::EvmClientConfig;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl JsonRpcError {
    /// Fold an `Error(string)` revert payload into the message.
    fn into_chain_error(self) -> ChainError {
        let reason = self
            .data
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|data| hex::decode(data.trim_start_matches("0x")).ok())
            .and_then(|bytes| decode_revert(&bytes));

        let message = match reason {
            Some(reason) if !self.message.contains(&reason) => {
                format!("execution reverted: {reason}")
            }
            _ => self.message,
        };
        ChainError::Rpc {
            code: self.code,
            message,
        }
    }
}

/// HTTP JSON-RPC client shared by the chain client and the wallet.
pub struct RpcTransport {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(config: &EvmClientConfig) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChainError::Network(e.to_string()))?;

        Ok(Self {
            http,
            url: config.rpc_url.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Call `method`. A `null` result comes back as `None`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> ChainResult<Option<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        trace!(method, id = request.id, "JSON-RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Network(format!("HTTP {status} from {method}")));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(format!("{method}: {e}")))?;

        if let Some(error) = body.error {
            return Err(error.into_chain_error());
        }

        match body.result {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ChainError::Decode(format!("{method}: {e}"))),
        }
    }

    /// Call `method`, treating a `null` result as an error.
    pub async fn call_required<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> ChainResult<T> {
        self.call(method, params)
            .await?
            .ok_or_else(|| ChainError::Decode(format!("{method}: null result")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> RpcTransport {
        RpcTransport::new(&EvmClientConfig {
            rpc_url: server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_result_and_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_chainId"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0xaa36a7"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": null})),
            )
            .mount(&server)
            .await;

        let rpc = transport(&server);
        let chain_id: Option<String> = rpc.call("eth_chainId", json!([])).await.unwrap();
        assert_eq!(chain_id.as_deref(), Some("0xaa36a7"));

        let receipt: Option<Value> = rpc
            .call("eth_getTransactionReceipt", json!(["0x00"]))
            .await
            .unwrap();
        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn test_rpc_error_with_revert_data() {
        let server = MockServer::start().await;
        // Error("nope")
        let data = "0x08c379a0\
            0000000000000000000000000000000000000000000000000000000000000020\
            0000000000000000000000000000000000000000000000000000000000000004\
            6e6f706500000000000000000000000000000000000000000000000000000000";
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": 3, "message": "execution reverted", "data": data}
            })))
            .mount(&server)
            .await;

        let err = transport(&server)
            .call::<String>("eth_call", json!([]))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::Rpc {
                code: 3,
                message: "execution reverted: nope".into()
            }
        );
    }

    #[tokio::test]
    async fn test_http_failure_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = transport(&server)
            .call::<String>("eth_blockNumber", json!([]))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(err, ChainError::Network(_)));
    }
}
