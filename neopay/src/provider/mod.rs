//! Wallet provider boundary.
//!
//! [`WalletProvider`] abstracts the injected-wallet contract (account
//! discovery, signing, transaction broadcast, chain management, event
//! notifications) so the rest of the library never depends on a concrete
//! wallet. [`LocalSignerProvider`] is the production implementation backed
//! by a local signing key and an HTTP JSON-RPC endpoint.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::WalletResult;
use crate::wallet::networks::NetworkConfig;

mod local;

pub use local::{LocalSignerProvider, LocalSignerProviderBuilder};

/// Capacity for the provider event broadcast channel.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 32;

/// A transaction request at the provider boundary.
///
/// `to == None` denotes contract creation.
#[derive(Debug, Clone, Default)]
pub struct TxRequest {
    /// Recipient address; `None` for contract creation.
    pub to: Option<Address>,
    /// Value in wei.
    pub value: U256,
    /// Calldata or deploy code.
    pub data: Vec<u8>,
}

impl TxRequest {
    /// A plain native-token transfer.
    #[must_use]
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to: Some(to),
            value,
            data: Vec::new(),
        }
    }

    /// A contract-creation transaction.
    #[must_use]
    pub fn deploy(code: Vec<u8>) -> Self {
        Self {
            to: None,
            value: U256::ZERO,
            data: code,
        }
    }

    /// A contract call with calldata and an optional attached value.
    #[must_use]
    pub fn call(to: Address, data: Vec<u8>, value: U256) -> Self {
        Self {
            to: Some(to),
            value,
            data,
        }
    }
}

/// A normalized transaction receipt.
///
/// Providers map their native receipt types into this shape so consumers
/// and tests never handle provider-specific structures.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Transaction hash.
    pub transaction_hash: B256,
    /// Deployed contract address, for creation transactions.
    pub contract_address: Option<Address>,
    /// Gas consumed by the transaction.
    pub gas_used: u64,
    /// Whether the transaction succeeded on chain.
    pub status: bool,
}

/// Notifications re-published from the underlying wallet.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// The set of authorized accounts changed. Empty means disconnected.
    AccountsChanged(Vec<Address>),
    /// The active chain changed; payload is the hex chain id.
    ChainChanged(String),
    /// The provider established a connection to a chain.
    Connect {
        /// Hex chain id of the connected chain.
        chain_id: String,
    },
    /// The provider lost its connection.
    Disconnect,
}

/// The injected-wallet contract.
///
/// Mirrors the EIP-1193 request surface the assistant needs:
/// `eth_requestAccounts`, `eth_accounts`, `eth_chainId`, `eth_getBalance`,
/// `eth_sendTransaction`, typed-data signing, and
/// `wallet_switchEthereumChain` / `wallet_addEthereumChain`.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request account access. May prompt the user.
    ///
    /// Fails with [`crate::error::WalletError::UserRejected`] if declined.
    async fn request_accounts(&self) -> WalletResult<Vec<Address>>;

    /// Already-authorized accounts, without prompting.
    async fn accounts(&self) -> WalletResult<Vec<Address>>;

    /// The active chain id as a `0x`-prefixed hex string.
    async fn chain_id(&self) -> WalletResult<String>;

    /// Native-token balance of `address`, in wei.
    async fn get_balance(&self, address: Address) -> WalletResult<U256>;

    /// Submit a transaction. Returns the hash at submission time, before
    /// any confirmation.
    async fn send_transaction(&self, tx: TxRequest) -> WalletResult<B256>;

    /// Receipt for a submitted transaction, if it has been mined.
    async fn transaction_receipt(&self, hash: B256) -> WalletResult<Option<TxReceipt>>;

    /// Sign an EIP-712 signing hash. Returns the `0x`-prefixed signature.
    ///
    /// The adapter computes the hash from a typed-data domain and struct;
    /// this is the local analogue of `eth_signTypedData_v4`.
    async fn sign_hash(&self, hash: B256) -> WalletResult<String>;

    /// Switch the active chain.
    ///
    /// Fails with [`crate::error::WalletError::UnrecognizedChain`] when the
    /// wallet does not know the chain (EIP-1193 error code 4902).
    async fn switch_chain(&self, chain_id: &str) -> WalletResult<()>;

    /// Register a chain with the wallet. Does not switch to it.
    async fn add_chain(&self, config: &NetworkConfig) -> WalletResult<()>;

    /// Subscribe to provider notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Format a numeric chain id as the `0x`-prefixed hex string used on the
/// provider boundary.
#[must_use]
pub fn chain_id_hex(chain_id: u64) -> String {
    format!("{chain_id:#x}")
}

/// Parse a `0x`-prefixed hex chain id.
pub fn parse_chain_id_hex(chain_id: &str) -> Option<u64> {
    u64::from_str_radix(chain_id.strip_prefix("0x")?, 16).ok()
}
