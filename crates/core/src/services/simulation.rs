//! Simulation gate: dry-runs the transfer before anything is signed.
//!
//! The gate opens only for a fully valid request with known token
//! metadata and a connected account. Every dry-run is tagged with the
//! request generation that issued it; results for an older generation
//! are dropped by the controller.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::SimulationError;
use crate::metrics::record_simulation;
use crate::models::{
    Address, CallDescriptor, DecimalAmount, FormFields, TokenStatus, TransferRequest, parse_address,
};
use crate::ports::ChainClient;

use super::validator::{ValidationState, is_submittable};

/// Simulation lifecycle for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SimulationState {
    /// Gate closed, nothing to simulate.
    #[default]
    Idle,
    /// Dry-run in flight.
    Pending {
        generation: u64,
        request: TransferRequest,
    },
    /// Dry-run succeeded; `call` is what gets signed.
    Ready {
        generation: u64,
        request: TransferRequest,
        call: CallDescriptor,
    },
    /// Dry-run failed; submission is disabled until the inputs change.
    Failed {
        generation: u64,
        request: TransferRequest,
        reason: String,
    },
}

impl SimulationState {
    /// Generation the state belongs to, if any.
    pub fn generation(&self) -> Option<u64> {
        match self {
            SimulationState::Idle => None,
            SimulationState::Pending { generation, .. }
            | SimulationState::Ready { generation, .. }
            | SimulationState::Failed { generation, .. } => Some(*generation),
        }
    }

    /// Request the state belongs to, if any.
    pub fn request(&self) -> Option<&TransferRequest> {
        match self {
            SimulationState::Idle => None,
            SimulationState::Pending { request, .. }
            | SimulationState::Ready { request, .. }
            | SimulationState::Failed { request, .. } => Some(request),
        }
    }
}

/// Build the request and its draft call, if the gate is open.
///
/// Open means: both addresses well-formed, amount positive and
/// representable in the token's base units, token metadata loaded,
/// no validation error, and an account to send from.
pub fn prepare(
    form: &FormFields,
    validation: &ValidationState,
    token: &TokenStatus,
    account: Option<Address>,
) -> Option<(TransferRequest, CallDescriptor)> {
    if !is_submittable(form, validation) {
        return None;
    }
    let from = account?;
    let balance = token.balance()?;
    let token_address = parse_address(&form.token_address).ok()?;
    let recipient = parse_address(&form.recipient).ok()?;
    let amount = DecimalAmount::parse(&form.amount).ok()?;
    if !amount.is_positive() {
        return None;
    }

    let request = TransferRequest {
        token_address,
        recipient,
        amount,
        decimals: balance.decimals,
    };
    let base_units = request.base_units()?;
    let call = CallDescriptor::erc20_transfer(from, token_address, recipient, base_units);
    Some((request, call))
}

/// Runs dry-runs against the chain client.
pub struct SimulationGate<C: ChainClient> {
    chain: Arc<C>,
}

impl<C: ChainClient> Clone for SimulationGate<C> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
        }
    }
}

impl<C: ChainClient> SimulationGate<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    /// Dry-run `call`. Failures are returned, never retried.
    #[instrument(skip_all, fields(generation = generation, to = %call.to))]
    pub async fn simulate(
        &self,
        generation: u64,
        call: &CallDescriptor,
    ) -> Result<CallDescriptor, SimulationError> {
        debug!("Simulating transfer");
        let result = self.chain.simulate(call).await;
        match &result {
            Ok(prepared) => {
                debug!(gas = ?prepared.gas, "Simulation succeeded");
                record_simulation("success");
            }
            Err(e) => {
                warn!(error = %e, "⚠️  Simulation failed");
                record_simulation("failure");
            }
        }
        result
    }
}
