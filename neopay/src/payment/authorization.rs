//! EIP-3009 transfer-authorization construction and signing.
//!
//! A payment requirement names an asset contract, recipient, and amount;
//! this module turns it into a signed `TransferWithAuthorization` message
//! under the asset's EIP-712 domain. The gasless transfer is executed by
//! the server-side facilitator, not by the payer's wallet.

use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::Eip712Domain;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;

use crate::error::{PaymentError, Result, WalletError};
use crate::wallet::WalletAdapter;

use super::{PaymentAuthorization, PaymentPayload, PaymentRequirement, network_chain_id};

/// How long a signed authorization stays valid, in seconds.
pub const AUTH_VALIDITY_SECS: u64 = 3600;

/// EIP-712 domain defaults when a requirement carries no `extra` hints.
/// These match the USDC token contract deployments.
const DEFAULT_ASSET_NAME: &str = "USD Coin";
const DEFAULT_ASSET_VERSION: &str = "2";

sol! {
    /// EIP-3009 transfer authorization message.
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

/// Build and sign a payment authorization for `requirement`.
///
/// Fails fast with [`PaymentError::WalletNotConnected`] before touching the
/// wallet when no session exists. The nonce is 32 random bytes from the OS,
/// never derived from time or a counter, so two authorizations for the same
/// transfer can never collide.
pub async fn build_authorization(
    wallet: &WalletAdapter,
    requirement: &PaymentRequirement,
) -> Result<PaymentPayload> {
    if !wallet.is_connected().await {
        return Err(PaymentError::WalletNotConnected.into());
    }
    let from = wallet
        .state()
        .await
        .account
        .ok_or(PaymentError::WalletNotConnected)?;

    let asset: Address = parse_field(&requirement.asset, "asset")?;
    let to: Address = parse_field(&requirement.pay_to, "payTo")?;
    let value: U256 = parse_field(&requirement.amount, "amount")?;
    let chain_id = challenge_chain_id(wallet, requirement).await?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| crate::error::Error::internal(e.to_string()))?
        .as_secs();
    let valid_after = U256::from(now);
    let valid_before = U256::from(now + AUTH_VALIDITY_SECS);

    let mut nonce_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = B256::from(nonce_bytes);

    let (name, version) = domain_hints(requirement);
    let domain = Eip712Domain::new(
        Some(Cow::Owned(name)),
        Some(Cow::Owned(version)),
        Some(U256::from(chain_id)),
        Some(asset),
        None,
    );

    let message = TransferWithAuthorization {
        from,
        to,
        value,
        validAfter: valid_after,
        validBefore: valid_before,
        nonce,
    };

    debug!(network = %requirement.network, asset = %asset, %value, "signing payment authorization");
    let signature = match wallet.sign_typed_data(&domain, &message).await {
        Ok(sig) => sig,
        Err(WalletError::UserRejected) => return Err(PaymentError::UserRejected.into()),
        Err(e) => return Err(e.into()),
    };

    Ok(PaymentPayload {
        scheme: "eip3009".to_string(),
        network: requirement.network.clone(),
        asset: requirement.asset.clone(),
        authorization: PaymentAuthorization {
            from: from.to_checksum(None),
            to: to.to_checksum(None),
            value: value.to_string(),
            valid_after: valid_after.to_string(),
            valid_before: valid_before.to_string(),
            nonce: format!("{nonce:#x}"),
            signature,
        },
    })
}

fn parse_field<T: std::str::FromStr>(raw: &str, field: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| {
        PaymentError::MalformedChallenge(format!("bad {field} '{raw}': {e}")).into()
    })
}

/// Chain id for the domain: the challenge's network name when recognized,
/// otherwise the wallet's active chain.
async fn challenge_chain_id(
    wallet: &WalletAdapter,
    requirement: &PaymentRequirement,
) -> Result<u64> {
    if let Some(id) = network_chain_id(&requirement.network) {
        return Ok(id);
    }
    let state = wallet.state().await;
    let hex = state.chain_id.ok_or_else(|| {
        PaymentError::MalformedChallenge(format!(
            "unknown network '{}' and no active chain",
            requirement.network
        ))
    })?;
    crate::provider::parse_chain_id_hex(&hex)
        .ok_or_else(|| PaymentError::MalformedChallenge(format!("bad chain id '{hex}'")).into())
}

fn domain_hints(requirement: &PaymentRequirement) -> (String, String) {
    let extra = requirement.extra.as_ref();
    let name = extra
        .and_then(|e| e.name.clone())
        .unwrap_or_else(|| DEFAULT_ASSET_NAME.to_string());
    let version = extra
        .and_then(|e| e.version.clone())
        .unwrap_or_else(|| DEFAULT_ASSET_VERSION.to_string());
    (name, version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::MockProvider;
    use std::sync::Arc;

    const ASSET: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";
    const PAY_TO: &str = "0x2222222222222222222222222222222222222222";

    fn requirement() -> PaymentRequirement {
        PaymentRequirement {
            scheme: "exact".into(),
            network: "base-sepolia".into(),
            asset: ASSET.into(),
            pay_to: PAY_TO.into(),
            amount: "100000".into(),
            description: None,
            max_timeout_seconds: None,
            extra: None,
        }
    }

    async fn connected_wallet(provider: &Arc<MockProvider>) -> WalletAdapter {
        let wallet = WalletAdapter::new(Arc::clone(provider) as Arc<dyn crate::provider::WalletProvider>);
        wallet.connect().await.unwrap();
        wallet
    }

    #[tokio::test]
    async fn test_authorization_window_and_value() {
        let provider = Arc::new(MockProvider::new(vec![Address::repeat_byte(1)], "0x14a34"));
        let wallet = connected_wallet(&provider).await;

        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let payload = build_authorization(&wallet, &requirement()).await.unwrap();
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        let auth = &payload.authorization;
        let valid_after: u64 = auth.valid_after.parse().unwrap();
        let valid_before: u64 = auth.valid_before.parse().unwrap();
        // The validity window is always exactly one hour.
        assert_eq!(valid_before - valid_after, AUTH_VALIDITY_SECS);
        assert!(valid_after >= before);
        assert!(valid_after <= after);

        assert_eq!(auth.value, "100000");
        assert_eq!(payload.scheme, "eip3009");
        assert_eq!(payload.network, "base-sepolia");
        assert!(auth.signature.starts_with("0x"));
        assert_eq!(provider.sign_calls(), 1);
    }

    #[tokio::test]
    async fn test_nonce_is_unique_per_authorization() {
        let provider = Arc::new(MockProvider::new(vec![Address::repeat_byte(1)], "0x14a34"));
        let wallet = connected_wallet(&provider).await;

        let a = build_authorization(&wallet, &requirement()).await.unwrap();
        let b = build_authorization(&wallet, &requirement()).await.unwrap();
        assert_ne!(a.authorization.nonce, b.authorization.nonce);
        assert_eq!(a.authorization.nonce.len(), 2 + 64);
    }

    #[tokio::test]
    async fn test_not_connected_never_signs() {
        let provider = Arc::new(MockProvider::new(vec![Address::repeat_byte(1)], "0x14a34"));
        let wallet = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn crate::provider::WalletProvider>);

        let err = build_authorization(&wallet, &requirement()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Payment(PaymentError::WalletNotConnected)
        ));
        assert_eq!(provider.sign_calls(), 0);
    }

    #[tokio::test]
    async fn test_user_rejection() {
        let provider = Arc::new(MockProvider::new(vec![Address::repeat_byte(1)], "0x14a34"));
        provider.set_reject_signing();
        let wallet = connected_wallet(&provider).await;

        let err = build_authorization(&wallet, &requirement()).await.unwrap_err();
        assert!(matches!(err, Error::Payment(PaymentError::UserRejected)));
    }

    #[tokio::test]
    async fn test_malformed_asset_address() {
        let provider = Arc::new(MockProvider::new(vec![Address::repeat_byte(1)], "0x14a34"));
        let wallet = connected_wallet(&provider).await;

        let mut req = requirement();
        req.asset = "not-an-address".into();
        let err = build_authorization(&wallet, &req).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Payment(PaymentError::MalformedChallenge(_))
        ));
        assert_eq!(provider.sign_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_network_falls_back_to_wallet_chain() {
        let provider = Arc::new(MockProvider::new(vec![Address::repeat_byte(1)], "0x2105"));
        let wallet = connected_wallet(&provider).await;

        let mut req = requirement();
        req.network = "some-custom-net".into();
        let payload = build_authorization(&wallet, &req).await.unwrap();
        assert_eq!(payload.network, "some-custom-net");
        assert_eq!(provider.sign_calls(), 1);
    }
}
