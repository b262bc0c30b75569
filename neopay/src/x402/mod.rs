//! x402 request orchestration.
//!
//! [`X402Client`] wraps an HTTP transport and transparently settles
//! HTTP 402 challenges: on a 402 it decodes the challenge, signs a payment
//! authorization with the wallet, and retries the original request exactly
//! once with the payment header attached. A second 402 is a server
//! rejection, never another payment attempt.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{ApiError, PaymentError, Result};
use crate::payment::{self, PaymentChallenge, Settlement};
use crate::wallet::WalletAdapter;

/// Request header carrying the base64 payment envelope.
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

/// Response header carrying base64 settlement details.
pub const PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// A transport-agnostic HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method, uppercase.
    pub method: String,
    pub url: String,
    /// JSON body, for POST requests.
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// A GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// A POST request with a JSON body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            body: Some(body),
            headers: Vec::new(),
        }
    }

    /// Attach a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with the given name, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A transport-agnostic HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// First header value with the given name, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// The HTTP execution seam; swapped for a scripted double in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, ApiError>;
}

/// Production transport backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, ApiError> {
        let mut builder = match request.method.as_str() {
            "POST" => self.client.post(&request.url),
            _ => self.client.get(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Outcome of a request that may have been paid for along the way.
#[derive(Debug, Clone)]
pub struct PaidResponse {
    pub status: u16,
    pub body: String,
    /// Settlement details, present when a payment was settled.
    pub settlement: Option<Settlement>,
}

impl PaidResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// HTTP client that settles 402 challenges with wallet-signed payments.
pub struct X402Client {
    transport: Arc<dyn Transport>,
    wallet: Arc<WalletAdapter>,
}

impl std::fmt::Debug for X402Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402Client")
            .field("wallet", &self.wallet)
            .finish_non_exhaustive()
    }
}

impl X402Client {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, wallet: Arc<WalletAdapter>) -> Self {
        Self { transport, wallet }
    }

    /// The wallet backing payment signatures.
    #[must_use]
    pub fn wallet(&self) -> &Arc<WalletAdapter> {
        &self.wallet
    }

    /// Execute `request`, paying one 402 challenge if the server issues one.
    ///
    /// Legacy direct-payment challenges are not settled here; they surface
    /// as [`PaymentError::LegacyPaymentRequired`] for the caller's
    /// interactive flow.
    pub async fn send(&self, request: HttpRequest) -> Result<PaidResponse> {
        let response = self.transport.execute(request.clone()).await?;
        if response.status != 402 {
            return finalize(response);
        }

        let challenge: PaymentChallenge = response
            .json()
            .map_err(|e| PaymentError::MalformedChallenge(e.to_string()))?;

        let requirement = match challenge {
            PaymentChallenge::Legacy {
                payment_request, ..
            } => {
                return Err(PaymentError::LegacyPaymentRequired(Box::new(payment_request)).into());
            }
            PaymentChallenge::Accepts { mut accepts, .. } => {
                if accepts.is_empty() {
                    return Err(PaymentError::NoAccepts.into());
                }
                accepts.remove(0)
            }
        };

        debug!(
            network = %requirement.network,
            amount = %requirement.amount,
            "received payment challenge"
        );
        let payload = payment::build_authorization(&self.wallet, &requirement).await?;
        let header = payload.to_header()?;

        let retry = request.with_header(PAYMENT_HEADER, header);
        let response = self.transport.execute(retry).await?;
        if response.status == 402 {
            return Err(PaymentError::Rejected.into());
        }

        let paid = finalize(response)?;
        if let Some(settlement) = &paid.settlement {
            info!(transaction = ?settlement.transaction, "payment settled");
        }
        Ok(paid)
    }
}

fn finalize(response: HttpResponse) -> Result<PaidResponse> {
    if !response.is_success() {
        return Err(ApiError::http(response.status, &response.body).into());
    }
    let settlement = response
        .header(PAYMENT_RESPONSE_HEADER)
        .and_then(payment::decode_settlement_header);
    Ok(PaidResponse {
        status: response.status,
        body: response.body,
        settlement,
    })
}
