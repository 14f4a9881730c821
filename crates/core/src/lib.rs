//! Core domain layer for Courier.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! the services driving an ERC-20 transfer from raw input to a confirmed
//! transaction. It follows hexagonal architecture principles - this is the
//! innermost layer with no I/O of its own.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     courier (binary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     courier-evm                             │
//! │              (JSON-RPC chain client + wallet)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     courier-core  ← YOU ARE HERE            │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Address, DecimalAmount, CallDescriptor, etc.)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Validation, simulation, confirmation, history, controller
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Key Concepts
//!
//! ## Ports
//!
//! - [`ports::ChainClient`] - Balances, dry-runs and receipts
//! - [`ports::WalletConnector`] - Account and signing
//!
//! ## Transfer Lifecycle
//!
//! 1. Field edits are validated ([`services::ValidationState`])
//! 2. A valid request is dry-run ([`services::SimulationGate`])
//! 3. Submit hands the simulated call to the wallet
//! 4. The broadcast transaction is observed ([`services::ConfirmationTracker`])
//! 5. The terminal outcome is appended to [`services::HistoryLedger`]
//!
//! [`services::TransferMachine`] holds the transition function;
//! [`services::TransferController`] runs its effects asynchronously.

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
