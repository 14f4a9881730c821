//! Adapter configuration.

use std::time::Duration;

/// Configuration for the EVM JSON-RPC client.
#[derive(Debug, Clone)]
pub struct EvmClientConfig {
    /// HTTP endpoint (e.g., "http://localhost:8545").
    pub rpc_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Symbol reported for native coin balances.
    pub native_symbol: String,
}

impl Default for EvmClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            request_timeout: Duration::from_secs(10),
            native_symbol: "ETH".to_string(),
        }
    }
}
