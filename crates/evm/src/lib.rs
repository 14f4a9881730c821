//! Ethereum JSON-RPC adapter for Courier.
//!
//! This crate implements the [`ChainClient`] and [`WalletConnector`] ports
//! from `courier-core` over HTTP JSON-RPC.
//!
//! # Features
//!
//! - ERC-20 `balanceOf` / `decimals` / `symbol` reads, native balance
//! - Dry-run via `eth_call` with gas estimation
//! - `Error(string)` revert reasons surfaced verbatim
//! - Receipt lookup (`null` reported as not found)
//! - Node-managed account signing via `eth_sendTransaction`
//!
//! # Usage
//!
//! ```ignore
//! use courier_evm::{EvmClient, EvmClientConfig};
//!
//! let config = EvmClientConfig {
//!     rpc_url: "http://localhost:8545".to_string(),
//!     ..Default::default()
//! };
//!
//! let client = EvmClient::new(config)?;
//! let wallet = client.wallet(None);
//! let chain_id = client.chain_id().await?;
//! ```
//!
//! [`ChainClient`]: courier_core::ports::ChainClient
//! [`WalletConnector`]: courier_core::ports::WalletConnector

mod abi;
mod client;
mod config;
mod rpc;
mod wallet;

pub use client::EvmClient;
pub use config::EvmClientConfig;
pub use wallet::EvmWallet;
