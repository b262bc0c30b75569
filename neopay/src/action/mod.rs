//! Blockchain action descriptors and results.
//!
//! The chat backend proposes actions as JSON objects tagged by an `action`
//! field; [`ActionDescriptor`] is the typed form. [`ActionResult`] is the
//! normalized outcome every execution produces.

use serde::{Deserialize, Deserializer, Serialize};

mod abi;
mod executor;
pub mod extract;

pub use executor::ActionExecutor;

/// A decimal ETH amount as it appears in action JSON.
///
/// The backend emits amounts as either a JSON number (`0.01`) or a string
/// (`"0.01"`); both deserialize to the canonical decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EthAmount(String);

impl EthAmount {
    /// The decimal string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EthAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EthAmount {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for EthAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => Ok(Self(s)),
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected number or string amount, got {other}"
            ))),
        }
    }
}

/// A structured blockchain action proposed by the assistant.
///
/// Immutable once constructed; produced by the chat backend or fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDescriptor {
    /// Send native ETH to a recipient.
    #[serde(rename_all = "camelCase")]
    TransferEth {
        /// Recipient address.
        recipient: String,
        /// Decimal ETH amount.
        amount: EthAmount,
    },

    /// Deploy a contract from bytecode and ABI.
    #[serde(rename_all = "camelCase")]
    DeployContract {
        /// Hex-encoded creation bytecode.
        bytecode: String,
        /// Contract JSON ABI.
        abi: serde_json::Value,
        /// Constructor arguments, JSON-encoded.
        #[serde(default)]
        constructor_args: Vec<serde_json::Value>,
        /// Optional display name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contract_name: Option<String>,
    },

    /// Call a method on a deployed contract.
    #[serde(rename_all = "camelCase")]
    CallContract {
        /// Deployed contract address.
        contract_address: String,
        /// Contract JSON ABI.
        abi: serde_json::Value,
        /// Method name to invoke.
        method: String,
        /// Method arguments, JSON-encoded.
        #[serde(default)]
        params: Vec<serde_json::Value>,
        /// Optional native-token value to attach, in decimal ETH.
        #[serde(default)]
        value: Option<EthAmount>,
    },

    /// Read a native-token balance. Read-only; never signs.
    #[serde(alias = "query_balance")]
    GetBalance {
        /// Address to query; defaults to the connected account.
        #[serde(default)]
        address: Option<String>,
    },
}

impl ActionDescriptor {
    /// One-line human description, shown on action cards.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::TransferEth { recipient, amount } => {
                format!("Transfer {amount} ETH to {recipient}")
            }
            Self::DeployContract { contract_name, .. } => match contract_name {
                Some(name) => format!("Deploy smart contract ({name})"),
                None => "Deploy smart contract".to_string(),
            },
            Self::CallContract {
                contract_address,
                method,
                ..
            } => format!("Call {method} on contract {contract_address}"),
            Self::GetBalance { address } => format!(
                "Check balance of {}",
                address.as_deref().unwrap_or("your account")
            ),
        }
    }
}

/// Normalized outcome of an executed action. Never mutated after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// Whether the action succeeded.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Transaction hash, when a transaction was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Deployed contract address, for deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// Formatted balance, for balance queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    /// Gas used, for contract calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<String>,
    /// Address that was queried, for balance queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ActionResult {
    /// A successful result with a message.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    /// A failed result with a message.
    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attach a transaction hash.
    #[must_use]
    pub fn with_tx_hash(mut self, hash: impl Into<String>) -> Self {
        self.tx_hash = Some(hash.into());
        self
    }
}
