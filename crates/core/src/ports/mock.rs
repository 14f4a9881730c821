//! Scriptable port fakes for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{ChainError, ChainResult, SimulationError, WalletError, WalletResult};
use crate::models::{Address, CallDescriptor, Receipt, TokenBalance, TxHash};

use super::{ChainClient, WalletConnector};

pub const GAS_ESTIMATE: u64 = 51_234;

#[derive(Default)]
struct ChainState {
    balance: Option<TokenBalance>,
    native: Option<TokenBalance>,
    balance_errors: VecDeque<ChainError>,
    simulations: VecDeque<Result<(), SimulationError>>,
    simulation_holds: VecDeque<Arc<Notify>>,
    receipts: VecDeque<ChainResult<Receipt>>,
    simulated: Vec<CallDescriptor>,
    balance_calls: usize,
    native_calls: usize,
    receipt_calls: usize,
}

/// Chain client fake.
///
/// Simulations succeed (with [`GAS_ESTIMATE`] filled in) unless scripted
/// otherwise; receipts report `NotFound` once the script is exhausted.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn with_balance(balance: TokenBalance) -> Self {
        let chain = Self::default();
        chain.set_balance(balance);
        chain
    }

    pub fn set_balance(&self, balance: TokenBalance) {
        self.lock().balance = Some(balance);
    }

    pub fn set_native_balance(&self, balance: TokenBalance) {
        self.lock().native = Some(balance);
    }

    pub fn fail_next_balance(&self, error: ChainError) {
        self.lock().balance_errors.push_back(error);
    }

    pub fn push_simulation(&self, result: Result<(), SimulationError>) {
        self.lock().simulations.push_back(result);
    }

    /// Hold the next simulation until the returned handle is notified.
    pub fn hold_next_simulation(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.lock().simulation_holds.push_back(notify.clone());
        notify
    }

    pub fn push_receipt(&self, result: ChainResult<Receipt>) {
        self.lock().receipts.push_back(result);
    }

    pub fn simulated(&self) -> Vec<CallDescriptor> {
        self.lock().simulated.clone()
    }

    pub fn balance_calls(&self) -> usize {
        self.lock().balance_calls
    }

    pub fn native_calls(&self) -> usize {
        self.lock().native_calls
    }

    pub fn receipt_calls(&self) -> usize {
        self.lock().receipt_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_balance(
        &self,
        _owner: &Address,
        token: Option<&Address>,
    ) -> ChainResult<TokenBalance> {
        let mut state = self.lock();
        if token.is_none() {
            state.native_calls += 1;
            return state
                .native
                .clone()
                .ok_or_else(|| ChainError::NotFound("native balance".into()));
        }
        state.balance_calls += 1;
        if let Some(error) = state.balance_errors.pop_front() {
            return Err(error);
        }
        state
            .balance
            .clone()
            .ok_or_else(|| ChainError::NotFound("token".into()))
    }

    async fn simulate(&self, call: &CallDescriptor) -> Result<CallDescriptor, SimulationError> {
        let hold = self.lock().simulation_holds.pop_front();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        let mut state = self.lock();
        state.simulated.push(call.clone());
        state.simulations.pop_front().unwrap_or(Ok(()))?;
        Ok(CallDescriptor {
            gas: Some(GAS_ESTIMATE),
            ..call.clone()
        })
    }

    async fn wait_for_receipt(&self, _tx_hash: &TxHash) -> ChainResult<Receipt> {
        let mut state = self.lock();
        state.receipt_calls += 1;
        state
            .receipts
            .pop_front()
            .unwrap_or_else(|| Err(ChainError::NotFound("receipt".into())))
    }
}

#[derive(Default)]
struct WalletState {
    account: Option<Address>,
    results: VecDeque<WalletResult<TxHash>>,
    holds: VecDeque<Arc<Notify>>,
    sent: Vec<CallDescriptor>,
}

/// Wallet connector fake.
///
/// Signs with a fixed hash unless scripted otherwise.
#[derive(Default)]
pub struct MockWallet {
    state: Mutex<WalletState>,
}

impl MockWallet {
    pub const HASH: TxHash = TxHash::repeat_byte(0x42);

    pub fn connected(account: Address) -> Self {
        let wallet = Self::default();
        wallet.state.lock().unwrap().account = Some(account);
        wallet
    }

    pub fn push_result(&self, result: WalletResult<TxHash>) {
        self.state.lock().unwrap().results.push_back(result);
    }

    /// Hold the next signature until the returned handle is notified.
    pub fn hold_next(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state.lock().unwrap().holds.push_back(notify.clone());
        notify
    }

    pub fn sent(&self) -> Vec<CallDescriptor> {
        self.state.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl WalletConnector for MockWallet {
    async fn get_account(&self) -> WalletResult<Option<Address>> {
        Ok(self.state.lock().unwrap().account)
    }

    async fn sign_and_send(&self, call: &CallDescriptor) -> WalletResult<TxHash> {
        let hold = self.state.lock().unwrap().holds.pop_front();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.account.is_none() {
            return Err(WalletError::Disconnected);
        }
        state.sent.push(call.clone());
        state.results.pop_front().unwrap_or(Ok(Self::HASH))
    }
}
