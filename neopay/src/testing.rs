//! Shared test doubles for the wallet-provider and HTTP-transport seams.

use std::sync::Mutex;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{WalletError, WalletResult};
use crate::provider::{ProviderEvent, TxReceipt, TxRequest, WalletProvider};
use crate::wallet::networks::NetworkConfig;
use crate::wallet::units;

/// Counters recorded by [`MockProvider`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MockCounters {
    pub send_calls: usize,
    pub sign_calls: usize,
    pub switch_calls: usize,
    pub balance_calls: usize,
}

#[derive(Debug, Default)]
struct MockState {
    counters: MockCounters,
    balances: Vec<(Address, U256)>,
    unrecognized_chains: Vec<String>,
    added_chains: Vec<NetworkConfig>,
    last_tx: Option<TxRequest>,
    send_error: Option<String>,
    reject_signing: bool,
    reject_connect: bool,
    receipt_missing: bool,
    contract_address: Option<Address>,
}

/// A scriptable in-memory wallet provider.
#[derive(Debug)]
pub struct MockProvider {
    accounts: Vec<Address>,
    chain_id: String,
    state: Mutex<MockState>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockProvider {
    pub fn new(accounts: Vec<Address>, chain_id: &str) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            accounts,
            chain_id: chain_id.to_string(),
            state: Mutex::new(MockState::default()),
            events,
        }
    }

    /// Push a provider event as if the wallet emitted it.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn set_balance(&self, address: Address, eth: &str) {
        let wei = units::parse_eth(eth).expect("valid test amount");
        self.state.lock().unwrap().balances.push((address, wei));
    }

    /// Chains the wallet will refuse to switch to until added (code 4902).
    pub fn set_unrecognized_chains(&self, chains: &[&str]) {
        self.state.lock().unwrap().unrecognized_chains =
            chains.iter().map(ToString::to_string).collect();
    }

    pub fn set_send_error(&self, msg: &str) {
        self.state.lock().unwrap().send_error = Some(msg.to_string());
    }

    pub fn set_reject_signing(&self) {
        self.state.lock().unwrap().reject_signing = true;
    }

    pub fn set_reject_connect(&self) {
        self.state.lock().unwrap().reject_connect = true;
    }

    pub fn set_receipt_missing(&self) {
        self.state.lock().unwrap().receipt_missing = true;
    }

    pub fn set_contract_address(&self, address: Address) {
        self.state.lock().unwrap().contract_address = Some(address);
    }

    pub fn counters(&self) -> MockCounters {
        self.state.lock().unwrap().counters
    }

    pub fn send_calls(&self) -> usize {
        self.counters().send_calls
    }

    pub fn sign_calls(&self) -> usize {
        self.counters().sign_calls
    }

    pub fn switch_calls(&self) -> usize {
        self.counters().switch_calls
    }

    pub fn added_chains(&self) -> Vec<NetworkConfig> {
        self.state.lock().unwrap().added_chains.clone()
    }

    pub fn last_tx(&self) -> Option<TxRequest> {
        self.state.lock().unwrap().last_tx.clone()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        if self.state.lock().unwrap().reject_connect {
            return Err(WalletError::UserRejected);
        }
        Ok(self.accounts.clone())
    }

    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> WalletResult<String> {
        Ok(self.chain_id.clone())
    }

    async fn get_balance(&self, address: Address) -> WalletResult<U256> {
        let mut state = self.state.lock().unwrap();
        state.counters.balance_calls += 1;
        Ok(state
            .balances
            .iter()
            .find(|(a, _)| *a == address)
            .map_or(U256::ZERO, |(_, b)| *b))
    }

    async fn send_transaction(&self, tx: TxRequest) -> WalletResult<B256> {
        let mut state = self.state.lock().unwrap();
        state.counters.send_calls += 1;
        state.last_tx = Some(tx);
        if let Some(msg) = &state.send_error {
            return Err(WalletError::transaction(msg.clone()));
        }
        Ok(B256::repeat_byte(0xaa))
    }

    async fn transaction_receipt(&self, hash: B256) -> WalletResult<Option<TxReceipt>> {
        let state = self.state.lock().unwrap();
        if state.receipt_missing {
            return Ok(None);
        }
        Ok(Some(TxReceipt {
            transaction_hash: hash,
            contract_address: state.contract_address,
            gas_used: 21_000,
            status: true,
        }))
    }

    async fn sign_hash(&self, hash: B256) -> WalletResult<String> {
        let mut state = self.state.lock().unwrap();
        state.counters.sign_calls += 1;
        if state.reject_signing {
            return Err(WalletError::UserRejected);
        }
        // Deterministic fake 65-byte signature derived from the hash.
        let h = hash.to_string();
        Ok(format!("0x{}{}1b", &h[2..], &h[2..]))
    }

    async fn switch_chain(&self, chain_id: &str) -> WalletResult<()> {
        let mut state = self.state.lock().unwrap();
        state.counters.switch_calls += 1;
        let known_via_add = state.added_chains.iter().any(|c| c.chain_id == chain_id);
        if !known_via_add && state.unrecognized_chains.iter().any(|c| c == chain_id) {
            return Err(WalletError::UnrecognizedChain(chain_id.to_string()));
        }
        drop(state);
        let _ = self
            .events
            .send(ProviderEvent::ChainChanged(chain_id.to_string()));
        Ok(())
    }

    async fn add_chain(&self, config: &NetworkConfig) -> WalletResult<()> {
        self.state.lock().unwrap().added_chains.push(config.clone());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// A scriptable HTTP transport for x402 orchestrator tests.
#[derive(Debug)]
pub struct MockTransport {
    responses: Mutex<Vec<crate::x402::HttpResponse>>,
    requests: Mutex<Vec<crate::x402::HttpRequest>>,
}

impl MockTransport {
    /// Queue responses in the order they should be returned.
    pub fn new(responses: Vec<crate::x402::HttpResponse>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<crate::x402::HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl crate::x402::Transport for MockTransport {
    async fn execute(
        &self,
        request: crate::x402::HttpRequest,
    ) -> std::result::Result<crate::x402::HttpResponse, crate::error::ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| crate::error::ApiError::Network("no scripted response left".into()))
    }
}
