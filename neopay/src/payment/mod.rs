//! Payment challenge and envelope types for HTTP 402 flows.
//!
//! Servers answer protected requests with a 402 body in one of two shapes:
//! the canonical form lists acceptable payment requirements under `accepts`;
//! the legacy form asks for a direct native-token payment and out-of-band
//! verification. [`PaymentChallenge`] decodes both.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::action::EthAmount;

mod authorization;

pub use authorization::{AUTH_VALIDITY_SECS, build_authorization};

/// EIP-712 domain hints carried alongside a requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetExtra {
    /// Token contract name, e.g. `USD Coin`.
    #[serde(default)]
    pub name: Option<String>,
    /// EIP-712 domain version.
    #[serde(default)]
    pub version: Option<String>,
}

/// One acceptable way to pay, from a challenge's `accepts` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    /// Payment scheme identifier, e.g. `exact` or `eip3009`.
    pub scheme: String,
    /// Network name, e.g. `base-sepolia`.
    pub network: String,
    /// Token contract address.
    pub asset: String,
    /// Recipient of the payment.
    pub pay_to: String,
    /// Amount in the token's smallest unit, as a decimal string.
    #[serde(alias = "maxAmountRequired")]
    pub amount: String,
    /// Human-readable description of what is being paid for.
    #[serde(default)]
    pub description: Option<String>,
    /// Server-side settlement deadline, seconds.
    #[serde(default)]
    pub max_timeout_seconds: Option<u64>,
    /// EIP-712 domain hints for the asset.
    #[serde(default)]
    pub extra: Option<AssetExtra>,
}

/// Legacy direct-payment instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyPaymentRequest {
    /// Always true in a legacy challenge.
    #[serde(default)]
    pub payment_required: bool,
    /// Amount to pay in decimal ETH.
    pub amount_eth: EthAmount,
    /// Address to pay.
    pub payment_address: String,
    /// How long a verified payment unlocks access for.
    #[serde(default)]
    pub validity_hours: Option<u64>,
    /// Free-form instructions from the server.
    #[serde(default)]
    pub instructions: Option<String>,
}

impl std::fmt::Display for LegacyPaymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pay {} ETH to {}",
            self.amount_eth, self.payment_address
        )
    }
}

/// Server-reported usage quota, carried in legacy challenges and status
/// responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStatus {
    /// Requests consumed so far.
    #[serde(default, alias = "requests_used")]
    pub requests_made: u64,
    /// Free-tier allowance.
    #[serde(default)]
    pub free_limit: u64,
    /// Whether the next request needs payment.
    #[serde(default)]
    pub payment_required: bool,
    /// Price of continued access, decimal ETH.
    #[serde(default)]
    pub payment_amount: Option<EthAmount>,
}

impl UserStatus {
    /// Free requests left before payment is required.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.free_limit.saturating_sub(self.requests_made)
    }
}

/// A 402 challenge body, in either of the shapes servers emit.
///
/// Decoding tries the canonical shape first; a body with neither shape
/// fails to deserialize.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PaymentChallenge {
    /// Canonical x402 challenge.
    Accepts {
        /// Acceptable payment requirements, in server preference order.
        accepts: Vec<PaymentRequirement>,
        /// Protocol version advertised by the server.
        #[serde(default, rename = "x402Version")]
        x402_version: Option<u64>,
        /// Optional server-side error message.
        #[serde(default)]
        error: Option<String>,
    },
    /// Legacy direct-payment challenge.
    Legacy {
        payment_request: LegacyPaymentRequest,
        #[serde(default)]
        user_status: Option<UserStatus>,
    },
}

/// A signed EIP-3009 transfer authorization, wire form.
///
/// All numeric fields are decimal strings; `nonce` and `signature` are
/// 0x-prefixed hex.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAuthorization {
    pub from: String,
    pub to: String,
    pub value: String,
    pub valid_after: String,
    pub valid_before: String,
    pub nonce: String,
    pub signature: String,
}

/// The payment envelope sent in the `X-PAYMENT` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPayload {
    /// Always `eip3009`.
    pub scheme: String,
    pub network: String,
    pub asset: String,
    pub authorization: PaymentAuthorization,
}

impl PaymentPayload {
    /// Encode as the base64 JSON header value.
    pub fn to_header(&self) -> crate::error::Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(BASE64.encode(json))
    }
}

/// Settlement details from the `X-PAYMENT-RESPONSE` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    #[serde(default)]
    pub success: bool,
    /// Settlement transaction hash.
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    /// Address the payment was drawn from.
    #[serde(default)]
    pub payer: Option<String>,
}

/// Decode a settlement header value. Malformed headers yield `None`; the
/// request already succeeded, so settlement details are best-effort.
#[must_use]
pub fn decode_settlement_header(value: &str) -> Option<Settlement> {
    let raw = BASE64.decode(value.trim()).ok()?;
    serde_json::from_slice(&raw).ok()
}

/// Chain id for the network names servers use in challenges.
#[must_use]
pub fn network_chain_id(network: &str) -> Option<u64> {
    match network {
        "base" | "base-mainnet" => Some(8453),
        "base-sepolia" => Some(84532),
        "ethereum" | "mainnet" => Some(1),
        "polygon" => Some(137),
        "sepolia" => Some(11_155_111),
        _ => None,
    }
}
