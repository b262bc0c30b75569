//! CLI shell for the Neo Pay assistant.
//!
//! Wires configuration into a wallet adapter and backend client, and hosts
//! the interactive chat session.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

pub mod chat;

use std::sync::Arc;

use anyhow::Context;
use neopay::prelude::*;

/// Construct the wallet adapter described by the configuration.
///
/// Without both an RPC endpoint and a private key, the adapter is created
/// unavailable: chat still works, wallet operations report the absence.
pub async fn build_wallet(config: &NeoPayConfig) -> anyhow::Result<Arc<WalletAdapter>> {
    let (Some(rpc_url), Some(private_key)) = (&config.rpc_url, &config.private_key) else {
        return Ok(Arc::new(WalletAdapter::unavailable()));
    };

    let mut builder = LocalSignerProvider::builder()
        .private_key(private_key)
        .rpc_url(rpc_url);
    if let Some(chain_id) = config.chain_id {
        builder = builder.chain_id(chain_id);
    }
    let provider = builder
        .build()
        .await
        .context("failed to initialize local wallet")?;

    Ok(Arc::new(
        WalletAdapter::new(Arc::new(provider))
            .with_confirmation_policy(config.confirm_interval, config.confirm_attempts),
    ))
}

/// Construct the backend client over a shared HTTP transport.
#[must_use]
pub fn build_api(config: &NeoPayConfig, wallet: Arc<WalletAdapter>) -> ApiClient {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new());
    ApiClient::new(config.api_url.clone(), transport, wallet)
}
