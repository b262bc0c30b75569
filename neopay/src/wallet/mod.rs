//! Wallet adapter: the single point of contact with the wallet provider.
//!
//! [`WalletAdapter`] owns the reactive [`WalletState`], re-publishes provider
//! notifications as adapter-level [`WalletEvent`]s, and exposes the wallet
//! operations the rest of the library needs: connect/disconnect, balance
//! reads, native transfers, typed-data signing, and network switching with
//! the add-network fallback.
//!
//! Consumers subscribe to [`WalletEvent`]s and decide their own re-fetch
//! policy; the adapter never reloads global state on a chain change.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::error::{Result, WalletError, WalletResult};
use crate::provider::{ProviderEvent, TxReceipt, TxRequest, WalletProvider};

pub mod networks;
pub mod units;

/// Capacity for the adapter event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Default polling interval while waiting for a transaction confirmation.
const DEFAULT_CONFIRM_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of polls before a confirmation wait times out.
const DEFAULT_CONFIRM_ATTEMPTS: u32 = 60;

/// Reactive wallet session state.
///
/// Mutated only by provider events or explicit connect/disconnect calls.
/// Invariant: `connected == account.is_some()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    /// The active account, if any.
    pub account: Option<Address>,
    /// Hex chain id of the active chain, if known.
    pub chain_id: Option<String>,
    /// Whether a wallet session exists.
    pub connected: bool,
}

/// Adapter-level wallet notifications.
#[derive(Debug, Clone)]
pub enum WalletEvent {
    /// The active account changed; `None` means the session ended.
    AccountChanged(Option<Address>),
    /// The active chain changed; payload is the hex chain id.
    ChainChanged(String),
    /// The wallet disconnected.
    Disconnected,
}

/// Single point of contact with the wallet provider.
pub struct WalletAdapter {
    /// The underlying provider, absent when no wallet exists in the
    /// environment.
    provider: Option<Arc<dyn WalletProvider>>,
    /// Session state, owned here.
    state: Arc<RwLock<WalletState>>,
    /// Adapter-level event channel.
    events: broadcast::Sender<WalletEvent>,
    /// Confirmation polling interval.
    confirm_interval: Duration,
    /// Confirmation polling attempts before timing out.
    confirm_attempts: u32,
}

impl std::fmt::Debug for WalletAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletAdapter")
            .field("available", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl WalletAdapter {
    /// Create an adapter over a wallet provider.
    ///
    /// Spawns the event pump that keeps [`WalletState`] in sync with
    /// provider notifications; must be called inside a tokio runtime.
    #[must_use]
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        let state = Arc::new(RwLock::new(WalletState::default()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let pump_state = Arc::clone(&state);
        let pump_events = events.clone();
        let mut rx = provider.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        Self::apply_provider_event(&pump_state, &pump_events, event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "wallet event pump lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self {
            provider: Some(provider),
            state,
            events,
            confirm_interval: DEFAULT_CONFIRM_INTERVAL,
            confirm_attempts: DEFAULT_CONFIRM_ATTEMPTS,
        }
    }

    /// Create an adapter for an environment with no wallet provider.
    ///
    /// Every wallet operation fails with [`WalletError::Unavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider: None,
            state: Arc::new(RwLock::new(WalletState::default())),
            events,
            confirm_interval: DEFAULT_CONFIRM_INTERVAL,
            confirm_attempts: DEFAULT_CONFIRM_ATTEMPTS,
        }
    }

    /// Override the confirmation polling policy.
    #[must_use]
    pub const fn with_confirmation_policy(mut self, interval: Duration, attempts: u32) -> Self {
        self.confirm_interval = interval;
        self.confirm_attempts = attempts;
        self
    }

    async fn apply_provider_event(
        state: &Arc<RwLock<WalletState>>,
        events: &broadcast::Sender<WalletEvent>,
        event: ProviderEvent,
    ) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let account = accounts.first().copied();
                {
                    let mut s = state.write().await;
                    s.account = account;
                    s.connected = account.is_some();
                }
                debug!(?account, "wallet account changed");
                let _ = events.send(WalletEvent::AccountChanged(account));
            }
            ProviderEvent::ChainChanged(chain_id) => {
                {
                    let mut s = state.write().await;
                    s.chain_id = Some(chain_id.clone());
                }
                debug!(chain_id = %chain_id, "wallet chain changed");
                let _ = events.send(WalletEvent::ChainChanged(chain_id));
            }
            ProviderEvent::Connect { chain_id } => {
                let mut s = state.write().await;
                s.chain_id = Some(chain_id);
            }
            ProviderEvent::Disconnect => {
                {
                    let mut s = state.write().await;
                    *s = WalletState::default();
                }
                info!("wallet disconnected");
                let _ = events.send(WalletEvent::Disconnected);
            }
        }
    }

    fn provider(&self) -> WalletResult<&Arc<dyn WalletProvider>> {
        self.provider.as_ref().ok_or(WalletError::Unavailable)
    }

    /// Whether a wallet provider is present in this environment.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Snapshot of the current session state.
    pub async fn state(&self) -> WalletState {
        self.state.read().await.clone()
    }

    /// Whether a session is currently connected.
    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    /// Already-authorized account, without prompting. `None` when no session
    /// has been granted.
    pub async fn current_account(&self) -> WalletResult<Option<Address>> {
        let provider = self.provider()?;
        Ok(provider.accounts().await?.first().copied())
    }

    /// Request account access and establish a session.
    ///
    /// May prompt the user; fails with [`WalletError::UserRejected`] if the
    /// prompt is declined.
    pub async fn connect(&self) -> WalletResult<WalletState> {
        let provider = self.provider()?;

        let accounts = provider.request_accounts().await?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| WalletError::config("no accounts found; unlock the wallet"))?;
        let chain_id = provider.chain_id().await?;

        let state = {
            let mut s = self.state.write().await;
            s.account = Some(account);
            s.chain_id = Some(chain_id);
            s.connected = true;
            s.clone()
        };

        info!(account = %account, chain_id = ?state.chain_id, "wallet connected");
        let _ = self.events.send(WalletEvent::AccountChanged(Some(account)));
        Ok(state)
    }

    /// End the session and clear state.
    pub async fn disconnect(&self) {
        {
            let mut s = self.state.write().await;
            *s = WalletState::default();
        }
        let _ = self.events.send(WalletEvent::Disconnected);
    }

    /// Native-token balance formatted to 4 decimals.
    ///
    /// Defaults to the session account when `address` is `None`.
    pub async fn get_balance(&self, address: Option<Address>) -> WalletResult<String> {
        let provider = self.provider()?;
        let address = match address {
            Some(a) => a,
            None => self
                .state
                .read()
                .await
                .account
                .ok_or(WalletError::NotConnected)?,
        };
        let wei = provider.get_balance(address).await?;
        Ok(units::format_eth_4dp(wei))
    }

    /// Submit a native-token transfer of a decimal ETH amount.
    ///
    /// Returns the transaction hash at submission time, before confirmation.
    pub async fn send_native_transfer(&self, to: Address, amount_eth: &str) -> Result<B256> {
        let provider = self.provider()?;
        if !self.is_connected().await {
            return Err(WalletError::NotConnected.into());
        }
        let wei = units::parse_eth(amount_eth)?;
        let hash = provider.send_transaction(TxRequest::transfer(to, wei)).await?;
        Ok(hash)
    }

    /// Submit an arbitrary transaction. Returns the submission-time hash.
    pub async fn send_transaction(&self, tx: TxRequest) -> WalletResult<B256> {
        let provider = self.provider()?;
        if !self.is_connected().await {
            return Err(WalletError::NotConnected);
        }
        provider.send_transaction(tx).await
    }

    /// Wait for a submitted transaction to be mined.
    ///
    /// Polls the provider with the configured interval and attempt bound so
    /// the caller is never stuck waiting forever on a wallet or node that
    /// went quiet.
    pub async fn wait_for_confirmation(&self, hash: B256) -> WalletResult<TxReceipt> {
        let provider = self.provider()?;
        for _ in 0..self.confirm_attempts {
            if let Some(receipt) = provider.transaction_receipt(hash).await? {
                if !receipt.status {
                    return Err(WalletError::transaction(format!(
                        "transaction {hash:#x} reverted"
                    )));
                }
                return Ok(receipt);
            }
            tokio::time::sleep(self.confirm_interval).await;
        }
        Err(WalletError::transaction(format!(
            "transaction {hash:#x} not confirmed after {} polls",
            self.confirm_attempts
        )))
    }

    /// Sign an EIP-712 typed-data value under the given domain.
    ///
    /// Returns the `0x`-prefixed signature string.
    pub async fn sign_typed_data<T: SolStruct + Sync>(
        &self,
        domain: &Eip712Domain,
        value: &T,
    ) -> WalletResult<String> {
        let provider = self.provider()?;
        if !self.is_connected().await {
            return Err(WalletError::NotConnected);
        }
        let hash = value.eip712_signing_hash(domain);
        provider.sign_hash(hash).await
    }

    /// Switch the wallet to `chain_id`.
    ///
    /// When the wallet does not know the chain, falls back to an add-network
    /// request using the static registry entry, then retries the switch once.
    pub async fn switch_network(&self, chain_id: &str) -> WalletResult<()> {
        let provider = self.provider()?;

        match provider.switch_chain(chain_id).await {
            Ok(()) => {}
            Err(WalletError::UnrecognizedChain(_)) => {
                let config = networks::lookup(chain_id)
                    .ok_or_else(|| WalletError::UnsupportedNetwork(chain_id.to_string()))?;
                provider.add_chain(config).await?;
                provider.switch_chain(chain_id).await?;
            }
            Err(e) => return Err(e),
        }

        let mut s = self.state.write().await;
        s.chain_id = Some(chain_id.to_string());
        Ok(())
    }

    /// Subscribe to adapter-level wallet events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use tokio_test::assert_ok;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[tokio::test]
    async fn test_connect_establishes_session() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x14a34"));
        let adapter = WalletAdapter::new(provider);

        let state = assert_ok!(adapter.connect().await);
        assert_eq!(state.account, Some(addr(1)));
        assert_eq!(state.chain_id.as_deref(), Some("0x14a34"));
        assert!(state.connected);
    }

    #[tokio::test]
    async fn test_state_invariant_across_account_events() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        let adapter = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);
        adapter.connect().await.unwrap();

        provider.emit(ProviderEvent::AccountsChanged(vec![addr(2)]));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let state = adapter.state().await;
        assert_eq!(state.account, Some(addr(2)));
        assert!(state.connected);

        // Empty account list means the session ended.
        provider.emit(ProviderEvent::AccountsChanged(vec![]));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let state = adapter.state().await;
        assert_eq!(state.account, None);
        assert!(!state.connected);
        assert_eq!(state.connected, state.account.is_some());
    }

    #[tokio::test]
    async fn test_chain_change_does_not_reset_session() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        let adapter = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);
        adapter.connect().await.unwrap();
        let mut events = adapter.subscribe();

        provider.emit(ProviderEvent::ChainChanged("0x2105".into()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let state = adapter.state().await;
        assert_eq!(state.chain_id.as_deref(), Some("0x2105"));
        assert!(state.connected);
        assert!(matches!(
            events.try_recv(),
            Ok(WalletEvent::ChainChanged(id)) if id == "0x2105"
        ));
    }

    #[tokio::test]
    async fn test_switch_network_falls_back_to_add_chain() {
        // Scenario: wallet does not have Base Sepolia configured.
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        provider.set_unrecognized_chains(&["0x14a34"]);
        let adapter = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);
        adapter.connect().await.unwrap();

        adapter.switch_network("0x14a34").await.unwrap();

        let added = provider.added_chains();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].chain_id, "0x14a34");
        assert_eq!(added[0].chain_name, "Base Sepolia");
        assert_eq!(provider.switch_calls(), 2);
        assert_eq!(adapter.state().await.chain_id.as_deref(), Some("0x14a34"));
    }

    #[tokio::test]
    async fn test_switch_network_unsupported_chain() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        provider.set_unrecognized_chains(&["0xdeadbeef"]);
        let adapter = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);
        adapter.connect().await.unwrap();

        let err = adapter.switch_network("0xdeadbeef").await.unwrap_err();
        assert!(matches!(err, WalletError::UnsupportedNetwork(_)));
        assert!(provider.added_chains().is_empty());
    }

    #[tokio::test]
    async fn test_connect_rejected_by_user() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        provider.set_reject_connect();
        let adapter = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);

        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, WalletError::UserRejected));
        assert!(!adapter.is_connected().await);
    }

    #[tokio::test]
    async fn test_unavailable_adapter() {
        let adapter = WalletAdapter::unavailable();
        assert!(!adapter.is_available());
        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, WalletError::Unavailable));
    }

    #[tokio::test]
    async fn test_balance_formatting() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        provider.set_balance(addr(1), "1.23456789");
        let adapter = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);
        adapter.connect().await.unwrap();

        let balance = adapter.get_balance(None).await.unwrap();
        assert_eq!(balance, "1.2345");
    }

    #[tokio::test]
    async fn test_confirmation_timeout() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        provider.set_receipt_missing();
        let adapter = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn WalletProvider>)
            .with_confirmation_policy(Duration::from_millis(1), 3);
        adapter.connect().await.unwrap();

        let err = adapter
            .wait_for_confirmation(B256::repeat_byte(9))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Transaction(_)));
    }
}
