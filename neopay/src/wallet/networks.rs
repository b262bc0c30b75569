//! Static registry of supported networks.
//!
//! Keyed by hex chain id, each entry carries what a wallet needs to add the
//! chain (`wallet_addEthereumChain` parameters): name, native currency,
//! RPC endpoints, and block explorers.

use std::sync::OnceLock;

/// Native currency descriptor for a network.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NativeCurrency {
    /// Display name, e.g. "ETH".
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Base-unit decimals (18 for all EVM native tokens here).
    pub decimals: u8,
}

impl NativeCurrency {
    fn eth() -> Self {
        Self {
            name: "ETH".into(),
            symbol: "ETH".into(),
            decimals: 18,
        }
    }
}

/// Parameters for registering a chain with a wallet.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Hex chain id, e.g. `0x14a34`.
    pub chain_id: String,
    /// Human-readable chain name.
    pub chain_name: String,
    /// Native currency of the chain.
    pub native_currency: NativeCurrency,
    /// JSON-RPC endpoints.
    pub rpc_urls: Vec<String>,
    /// Block explorer base URLs.
    pub block_explorer_urls: Vec<String>,
}

impl NetworkConfig {
    /// A minimal entry for a chain outside the static registry.
    #[must_use]
    pub fn custom(
        chain_id: impl Into<String>,
        chain_name: impl Into<String>,
        rpc_url: impl Into<String>,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            chain_name: chain_name.into(),
            native_currency: NativeCurrency::eth(),
            rpc_urls: vec![rpc_url.into()],
            block_explorer_urls: Vec::new(),
        }
    }
}

fn entry(
    chain_id: &str,
    chain_name: &str,
    currency: NativeCurrency,
    rpc_url: &str,
    explorer_url: &str,
) -> NetworkConfig {
    NetworkConfig {
        chain_id: chain_id.into(),
        chain_name: chain_name.into(),
        native_currency: currency,
        rpc_urls: vec![rpc_url.into()],
        block_explorer_urls: vec![explorer_url.into()],
    }
}

fn registry() -> &'static [NetworkConfig] {
    static REGISTRY: OnceLock<Vec<NetworkConfig>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let matic = NativeCurrency {
            name: "MATIC".into(),
            symbol: "MATIC".into(),
            decimals: 18,
        };
        vec![
            entry(
                "0x1",
                "Ethereum Mainnet",
                NativeCurrency::eth(),
                "https://mainnet.infura.io/v3/",
                "https://etherscan.io/",
            ),
            entry(
                "0x89",
                "Polygon Mainnet",
                matic.clone(),
                "https://polygon-rpc.com/",
                "https://polygonscan.com/",
            ),
            entry(
                "0x2105",
                "Base",
                NativeCurrency::eth(),
                "https://mainnet.base.org/",
                "https://basescan.org/",
            ),
            entry(
                "0x14a34",
                "Base Sepolia",
                NativeCurrency::eth(),
                "https://sepolia.base.org/",
                "https://sepolia.basescan.org/",
            ),
            entry(
                "0xaa36a7",
                "Sepolia Testnet",
                NativeCurrency::eth(),
                "https://rpc.sepolia.org/",
                "https://sepolia.etherscan.io/",
            ),
            entry(
                "0x13881",
                "Polygon Mumbai",
                matic,
                "https://rpc-mumbai.maticvigil.com/",
                "https://mumbai.polygonscan.com/",
            ),
        ]
    })
}

/// All networks in the static registry.
#[must_use]
pub fn all() -> &'static [NetworkConfig] {
    registry()
}

/// Look up the registry entry for a hex chain id.
#[must_use]
pub fn lookup(chain_id: &str) -> Option<&'static NetworkConfig> {
    registry().iter().find(|n| n.chain_id == chain_id)
}

/// Human-readable network name for a hex chain id.
#[must_use]
pub fn network_name(chain_id: &str) -> &'static str {
    lookup(chain_id).map_or("Unknown Network", |n| n.chain_name.as_str())
}

/// Block explorer URL for a transaction hash, when the chain has one.
#[must_use]
pub fn explorer_tx_url(chain_id: &str, tx_hash: &str) -> Option<String> {
    let base = lookup(chain_id)?.block_explorer_urls.first()?;
    Some(format!("{}tx/{tx_hash}", base))
}

/// Shorten an address or hash for display: `0x1234...abcd`.
///
/// Also applied to server-supplied strings, so it counts characters rather
/// than slicing bytes.
#[must_use]
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
