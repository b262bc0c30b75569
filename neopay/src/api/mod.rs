//! Backend API client.
//!
//! Chat requests go through the [`X402Client`] so 402 challenges are paid
//! in-line; the verification and status endpoints are plain HTTP since the
//! server never charges for them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{PaymentError, Result};
use crate::payment::{Settlement, UserStatus};
use crate::wallet::WalletAdapter;
use crate::x402::{HttpRequest, Transport, X402Client};

/// Most recent turns sent as chat context.
const HISTORY_WINDOW: usize = 10;

/// One prior turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// `user` or `assistant`.
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A chat completion from the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub success: bool,
    /// Assistant reply text; may embed an action JSON object.
    #[serde(default)]
    pub response: String,
    /// Retrieval chunks consulted for this answer.
    #[serde(default)]
    pub context_chunks: Option<u64>,
    /// Unprocessed model output, when the server exposes it.
    #[serde(default)]
    pub raw_llm_output: Option<String>,
    #[serde(default, alias = "requests_used")]
    pub requests_made: Option<u64>,
    #[serde(default)]
    pub free_limit: Option<u64>,
    #[serde(default)]
    pub remaining: Option<u64>,
}

/// A chat reply plus any payment settled to obtain it.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub response: ChatResponse,
    pub settlement: Option<Settlement>,
}

#[derive(Debug, Deserialize)]
struct Verification {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    verification: Option<Verification>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the assistant backend.
pub struct ApiClient {
    base_url: String,
    x402: X402Client,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the backend at `base_url`.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        wallet: Arc<WalletAdapter>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            x402: X402Client::new(Arc::clone(&transport), wallet),
            transport,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a chat message with recent history, paying a 402 if challenged.
    pub async fn chat(&self, message: &str, history: &[ChatTurn]) -> Result<ChatReply> {
        let window = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
        let request = HttpRequest::post(
            self.url("/api/chat"),
            json!({
                "message": message,
                "history": window,
            }),
        );

        let paid = self.x402.send(request).await?;
        let response: ChatResponse = paid.json()?;
        debug!(context_chunks = ?response.context_chunks, "chat reply received");
        Ok(ChatReply {
            response,
            settlement: paid.settlement,
        })
    }

    /// Submit a direct-payment transaction hash for verification.
    ///
    /// Used after settling a legacy challenge on-chain.
    pub async fn verify_payment(&self, tx_hash: &str) -> Result<()> {
        let request = HttpRequest::post(
            self.url("/api/payment/verify"),
            json!({ "tx_hash": tx_hash }),
        );
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(crate::error::ApiError::http(response.status, &response.body).into());
        }

        let decoded: VerifyResponse = response.json()?;
        let verified = decoded.success
            && decoded
                .verification
                .as_ref()
                .is_none_or(|v| v.success);
        if verified {
            return Ok(());
        }

        let reason = decoded
            .verification
            .and_then(|v| v.error)
            .or(decoded.error)
            .unwrap_or_else(|| "payment not found on chain".to_string());
        Err(PaymentError::VerificationFailed(reason).into())
    }

    /// Fetch the caller's usage quota.
    pub async fn user_status(&self) -> Result<UserStatus> {
        let request = HttpRequest::get(self.url("/api/user/status"));
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(crate::error::ApiError::http(response.status, &response.body).into());
        }
        Ok(response.json()?)
    }
}
