//! Unified error types for the neopay library.
//!
//! Each component has its own error enum; all of them convert into the
//! crate-level [`Error`] so callers can use a single [`Result`] alias.
//! Component boundaries are expected to recover from these errors and
//! surface them as non-fatal, user-visible messages.

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for neopay operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Wallet provider error.
    #[error("wallet: {0}")]
    Wallet(#[from] WalletError),

    /// Malformed action input.
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    /// Payment authorization or settlement error.
    #[error("payment: {0}")]
    Payment(#[from] PaymentError),

    /// Backend API error.
    #[error("api: {0}")]
    Api(#[from] ApiError),

    /// Action extraction error.
    #[error("extract: {0}")]
    Extract(#[from] ExtractError),

    /// Configuration error.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization/deserialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Create an internal error.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias for neopay operations.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Wallet Errors
// ============================================================================

/// Error type for wallet provider and adapter operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WalletError {
    /// No wallet provider is present in the execution environment.
    #[error("no wallet provider available")]
    Unavailable,

    /// The operation requires a connected wallet session.
    #[error("wallet not connected")]
    NotConnected,

    /// The user declined a prompt or signature request.
    #[error("user rejected the request")]
    UserRejected,

    /// Provider or node failure.
    #[error("rpc: {0}")]
    Rpc(String),

    /// Signing failed for a reason other than user rejection.
    #[error("signing: {0}")]
    Signing(String),

    /// Transaction submission or confirmation failed.
    #[error("transaction: {0}")]
    Transaction(String),

    /// The wallet does not know the requested chain (EIP-1193 code 4902).
    #[error("unrecognized chain: {0}")]
    UnrecognizedChain(String),

    /// The chain is not in the static network registry.
    #[error("network {0} not supported")]
    UnsupportedNetwork(String),

    /// Wallet configuration error.
    #[error("config: {0}")]
    Config(String),
}

impl WalletError {
    /// Create an RPC error.
    #[inline]
    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::Rpc(msg.into())
    }

    /// Create a transaction error.
    #[inline]
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// Create a config error.
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = std::result::Result<T, WalletError>;

// ============================================================================
// Validation Errors
// ============================================================================

/// Error type for malformed action input.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// Malformed address.
    #[error("invalid address: {0}")]
    Address(String),

    /// Malformed or non-positive amount.
    #[error("invalid amount: {0}")]
    Amount(String),

    /// Malformed contract ABI.
    #[error("invalid abi: {0}")]
    Abi(String),

    /// Malformed call or constructor parameter.
    #[error("invalid parameter: {0}")]
    Param(String),

    /// Malformed bytecode.
    #[error("invalid bytecode: {0}")]
    Bytecode(String),
}

// ============================================================================
// Payment Errors
// ============================================================================

/// Error type for the payment authorization and x402 flow.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PaymentError {
    /// A 402 challenge arrived while no wallet session exists.
    #[error("wallet not connected; connect before paying")]
    WalletNotConnected,

    /// The user declined the authorization signature.
    #[error("payment authorization rejected by user")]
    UserRejected,

    /// The server returned a second 402 after a paid retry.
    #[error("payment rejected by server")]
    Rejected,

    /// The 402 response body did not match any known challenge shape.
    #[error("malformed payment challenge: {0}")]
    MalformedChallenge(String),

    /// The 402 challenge offered no payment options.
    #[error("payment challenge offered no accepted payment methods")]
    NoAccepts,

    /// The server rejected a submitted authorization or transaction hash.
    #[error("payment verification failed: {0}")]
    VerificationFailed(String),

    /// The server issued a legacy direct-payment challenge.
    ///
    /// The caller is expected to run the interactive pay-and-verify flow
    /// with the enclosed request details.
    #[error("payment required: {} ETH to {}", .0.amount_eth, .0.payment_address)]
    LegacyPaymentRequired(Box<crate::payment::LegacyPaymentRequest>),
}

// ============================================================================
// API Errors
// ============================================================================

/// Error type for backend HTTP calls.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Non-2xx, non-402 response from the backend.
    #[error("http {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for display.
        body: String,
    },

    /// Network-level failure reaching the backend.
    #[error("network: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    /// Create an HTTP status error, truncating the body for display.
    ///
    /// The body is server-controlled and may hold multibyte characters, so
    /// the cut is backed off to the nearest character boundary.
    #[must_use]
    pub fn http(status: u16, body: &str) -> Self {
        let mut end = body.len().min(200);
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        Self::Http {
            status,
            body: body[..end].to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network("request timed out".into())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

// ============================================================================
// Extraction Errors
// ============================================================================

/// Error type for pulling structured actions out of LLM output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// No balanced, parseable JSON value was found in the text.
    #[error("no JSON value found in text")]
    NoJson,

    /// A JSON value was found but it is not a recognized action.
    #[error("JSON value is not a blockchain action: {0}")]
    NotAnAction(String),
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Missing required setting.
    #[error("missing: {0}")]
    Missing(String),

    /// Invalid setting value.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Setting name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Create a missing setting error.
    #[inline]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Missing(name.into())
    }

    /// Create an invalid setting error.
    #[inline]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: Error = WalletError::NotConnected.into();
        assert!(matches!(err, Error::Wallet(_)));

        let err: Error = PaymentError::Rejected.into();
        assert!(matches!(err, Error::Payment(_)));

        let err: Error = ValidationError::Amount("0".into()).into();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_api_error_truncates_body() {
        let long = "x".repeat(500);
        let err = ApiError::http(500, &long);
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_truncates_on_char_boundary() {
        // A multibyte character straddling the cut must not split.
        let body = format!("{}₿tail", "x".repeat(199));
        let err = ApiError::http(500, &body);
        match err {
            ApiError::Http { body, .. } => {
                assert_eq!(body, "x".repeat(199));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let short = "héllo";
        match ApiError::http(500, short) {
            ApiError::Http { body, .. } => assert_eq!(body, short),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
