//! Local-signer wallet provider.
//!
//! Implements [`WalletProvider`] with an in-process signing key and an HTTP
//! JSON-RPC endpoint, the native-client stand-in for a browser-injected
//! wallet. Chain switching reconnects the RPC provider against a per-wallet
//! network table; chains absent from the table must be registered through
//! [`WalletProvider::add_chain`] first, mirroring the `wallet_addEthereumChain`
//! fallback.

use std::collections::HashMap;

use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, B256, U256, hex};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use super::{
    EVENT_CHANNEL_CAPACITY, ProviderEvent, TxReceipt, TxRequest, WalletProvider, chain_id_hex,
};
use crate::error::{WalletError, WalletResult};
use crate::wallet::networks::{self, NetworkConfig};

/// Builder for constructing a [`LocalSignerProvider`].
///
/// # Examples
///
/// ```rust,ignore
/// let provider = LocalSignerProvider::builder()
///     .private_key("0xabc...")
///     .rpc_url("https://sepolia.base.org/")
///     .build()
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct LocalSignerProviderBuilder {
    /// Raw private key hex string.
    private_key: Option<String>,
    /// JSON-RPC endpoint URL.
    rpc_url: Option<String>,
    /// Chain ID (auto-detected if not set).
    chain_id: Option<u64>,
    /// Extra networks to pre-register for chain switching.
    extra_networks: Vec<NetworkConfig>,
}

impl LocalSignerProviderBuilder {
    /// Set the private key (hex string, with or without 0x prefix).
    #[must_use]
    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Set the JSON-RPC endpoint URL.
    #[must_use]
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set the chain ID explicitly (auto-detected from RPC if not set).
    #[must_use]
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Pre-register an additional network for chain switching.
    #[must_use]
    pub fn network(mut self, config: NetworkConfig) -> Self {
        self.extra_networks.push(config);
        self
    }

    /// Build the [`LocalSignerProvider`].
    ///
    /// Both `private_key` and `rpc_url` are required.
    pub async fn build(mut self) -> WalletResult<LocalSignerProvider> {
        let rpc_url = self
            .rpc_url
            .take()
            .ok_or_else(|| WalletError::config("rpc_url is required"))?;

        let key = self
            .private_key
            .take()
            .ok_or_else(|| WalletError::config("private_key is required"))?;
        let key = key.strip_prefix("0x").unwrap_or(&key);
        let mut signer = key
            .parse::<PrivateKeySigner>()
            .map_err(|e| WalletError::config(format!("invalid private key: {e}")))?;

        if let Some(chain_id) = self.chain_id {
            signer.set_chain_id(Some(chain_id));
        }

        let address = signer.address();

        let provider = connect(&signer, &rpc_url).await?;

        let chain_id = if let Some(id) = self.chain_id {
            id
        } else {
            provider
                .get_chain_id()
                .await
                .map_err(|e| WalletError::rpc(format!("failed to get chain ID: {e}")))?
        };
        let chain_hex = chain_id_hex(chain_id);

        // The connected chain is always known to the wallet. Registry entries
        // for it keep the canonical name and explorer URLs.
        let mut known = HashMap::new();
        let seed = networks::lookup(&chain_hex).cloned().unwrap_or_else(|| {
            NetworkConfig::custom(&chain_hex, format!("Chain {chain_hex}"), &rpc_url)
        });
        known.insert(chain_hex.clone(), seed);
        for config in self.extra_networks.drain(..) {
            known.insert(config.chain_id.clone(), config);
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(
            address = %address,
            chain_id = chain_id,
            "local signer provider initialized",
        );

        Ok(LocalSignerProvider {
            signer,
            address,
            active: RwLock::new(Active {
                provider,
                chain_id: chain_hex,
            }),
            known_networks: RwLock::new(known),
            events,
        })
    }
}

/// The active RPC connection.
struct Active {
    provider: DynProvider<Ethereum>,
    chain_id: String,
}

/// A wallet provider backed by a local signing key and an HTTP RPC endpoint.
pub struct LocalSignerProvider {
    /// Local signer for transactions and typed-data hashes.
    signer: PrivateKeySigner,
    /// The wallet's address.
    address: Address,
    /// Current RPC connection and chain.
    active: RwLock<Active>,
    /// Networks this wallet knows how to connect to, keyed by hex chain id.
    known_networks: RwLock<HashMap<String, NetworkConfig>>,
    /// Provider notifications.
    events: broadcast::Sender<ProviderEvent>,
}

impl std::fmt::Debug for LocalSignerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSignerProvider")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

async fn connect(signer: &PrivateKeySigner, rpc_url: &str) -> WalletResult<DynProvider<Ethereum>> {
    Ok(ProviderBuilder::new()
        .wallet(signer.clone())
        .connect(rpc_url)
        .await
        .map_err(|e| WalletError::rpc(format!("failed to connect to '{rpc_url}': {e}")))?
        .erased())
}

impl LocalSignerProvider {
    /// Create a builder for constructing a [`LocalSignerProvider`].
    #[must_use]
    pub fn builder() -> LocalSignerProviderBuilder {
        LocalSignerProviderBuilder::default()
    }

    /// The wallet's address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl WalletProvider for LocalSignerProvider {
    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        // A local key never prompts; access is always granted.
        Ok(vec![self.address])
    }

    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        Ok(vec![self.address])
    }

    async fn chain_id(&self) -> WalletResult<String> {
        Ok(self.active.read().await.chain_id.clone())
    }

    async fn get_balance(&self, address: Address) -> WalletResult<U256> {
        let active = self.active.read().await;
        active
            .provider
            .get_balance(address)
            .await
            .map_err(|e| WalletError::rpc(format!("failed to get balance: {e}")))
    }

    async fn send_transaction(&self, tx: TxRequest) -> WalletResult<B256> {
        let mut request = TransactionRequest::default().with_value(tx.value);
        request = match tx.to {
            Some(to) => request.with_to(to).with_input(tx.data),
            None => request.with_deploy_code(tx.data),
        };

        let active = self.active.read().await;
        let pending = active
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| WalletError::transaction(format!("send failed: {e}")))?;

        let hash = *pending.tx_hash();
        debug!(tx_hash = %hash, "transaction submitted");
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> WalletResult<Option<TxReceipt>> {
        let active = self.active.read().await;
        let receipt = active
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| WalletError::rpc(format!("failed to get receipt: {e}")))?;

        Ok(receipt.map(|r| TxReceipt {
            transaction_hash: r.transaction_hash,
            contract_address: r.contract_address,
            gas_used: u64::try_from(r.gas_used).unwrap_or(u64::MAX),
            status: r.status(),
        }))
    }

    async fn sign_hash(&self, hash: B256) -> WalletResult<String> {
        let sig = self
            .signer
            .sign_hash(&hash)
            .await
            .map_err(|e| WalletError::Signing(format!("hash signing failed: {e}")))?;
        Ok(format!("0x{}", hex::encode(sig.as_bytes())))
    }

    async fn switch_chain(&self, chain_id: &str) -> WalletResult<()> {
        {
            let active = self.active.read().await;
            if active.chain_id == chain_id {
                return Ok(());
            }
        }

        let config = {
            let known = self.known_networks.read().await;
            known
                .get(chain_id)
                .cloned()
                .ok_or_else(|| WalletError::UnrecognizedChain(chain_id.to_string()))?
        };

        let rpc_url = config
            .rpc_urls
            .first()
            .ok_or_else(|| WalletError::config(format!("network {chain_id} has no RPC URL")))?;

        let provider = connect(&self.signer, rpc_url).await?;

        {
            let mut active = self.active.write().await;
            active.provider = provider;
            active.chain_id = chain_id.to_string();
        }

        info!(chain_id = %chain_id, network = %config.chain_name, "switched chain");
        let _ = self
            .events
            .send(ProviderEvent::ChainChanged(chain_id.to_string()));
        Ok(())
    }

    async fn add_chain(&self, config: &NetworkConfig) -> WalletResult<()> {
        if config.rpc_urls.is_empty() {
            return Err(WalletError::config(format!(
                "network {} has no RPC URL",
                config.chain_id
            )));
        }
        let mut known = self.known_networks.write().await;
        debug!(chain_id = %config.chain_id, network = %config.chain_name, "network registered");
        known.insert(config.chain_id.clone(), config.clone());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
