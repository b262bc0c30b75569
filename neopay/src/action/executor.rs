//! Maps an [`ActionDescriptor`] to wallet calls and a normalized
//! [`ActionResult`].
//!
//! The executor never propagates errors past its own boundary: validation
//! failures and wallet errors alike become `{ success: false, message }`,
//! so callers only branch on `success`.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ActionDescriptor, ActionResult, abi};
use crate::error::{Result, ValidationError, WalletError};
use crate::provider::TxRequest;
use crate::wallet::{WalletAdapter, units};

/// Shown when an action is attempted without a wallet session.
pub const NOT_CONNECTED_MESSAGE: &str = "Please connect your wallet first";

/// Shown when an action is attempted while another is still in flight.
pub const BUSY_MESSAGE: &str = "Another action is already in flight";

/// Executes blockchain actions through the wallet adapter.
#[derive(Debug)]
pub struct ActionExecutor {
    wallet: Arc<WalletAdapter>,
    /// Single-flight guard: one action at a time.
    flight: Mutex<()>,
}

impl ActionExecutor {
    /// Create an executor over a wallet adapter.
    #[must_use]
    pub fn new(wallet: Arc<WalletAdapter>) -> Self {
        Self {
            wallet,
            flight: Mutex::new(()),
        }
    }

    /// Execute an action and report the normalized outcome.
    ///
    /// Requires a connected wallet; re-entrant calls while an action is in
    /// flight fail fast without touching the wallet.
    pub async fn execute(&self, action: &ActionDescriptor) -> ActionResult {
        let Ok(_guard) = self.flight.try_lock() else {
            return ActionResult::err(BUSY_MESSAGE);
        };

        if !self.wallet.is_connected().await {
            return ActionResult::err(NOT_CONNECTED_MESSAGE);
        }

        debug!(action = %action.describe(), "executing blockchain action");
        let outcome = match action {
            ActionDescriptor::TransferEth { recipient, amount } => {
                self.transfer_eth(recipient, amount.as_str()).await
            }
            ActionDescriptor::DeployContract {
                bytecode,
                abi,
                constructor_args,
                ..
            } => self.deploy_contract(bytecode, abi, constructor_args).await,
            ActionDescriptor::CallContract {
                contract_address,
                abi,
                method,
                params,
                value,
            } => {
                self.call_contract(
                    contract_address,
                    abi,
                    method,
                    params,
                    value.as_ref().map(super::EthAmount::as_str),
                )
                .await
            }
            ActionDescriptor::GetBalance { address } => self.get_balance(address.as_deref()).await,
        };

        outcome.unwrap_or_else(|e| ActionResult::err(e.to_string()))
    }

    async fn transfer_eth(&self, recipient: &str, amount: &str) -> Result<ActionResult> {
        // Validate before touching the wallet.
        let to = parse_address(recipient)?;
        units::parse_positive_eth(amount)?;

        let hash = self.wallet.send_native_transfer(to, amount).await?;
        self.wallet.wait_for_confirmation(hash).await?;

        info!(tx_hash = %hash, "transfer confirmed");
        Ok(
            ActionResult::ok(format!("Successfully transferred {amount} ETH to {recipient}"))
                .with_tx_hash(format!("{hash:#x}")),
        )
    }

    async fn deploy_contract(
        &self,
        bytecode: &str,
        abi_json: &serde_json::Value,
        constructor_args: &[serde_json::Value],
    ) -> Result<ActionResult> {
        let mut code = abi::decode_bytecode(bytecode)?;
        let abi = abi::parse_abi(abi_json)?;
        code.extend(abi::encode_constructor_args(&abi, constructor_args)?);

        let hash = self.wallet.send_transaction(TxRequest::deploy(code)).await?;
        let receipt = self.wallet.wait_for_confirmation(hash).await?;

        let address = receipt.contract_address.ok_or_else(|| {
            WalletError::transaction("deployment receipt carried no contract address")
        })?;
        let address = address.to_checksum(None);

        info!(contract = %address, tx_hash = %hash, "contract deployed");
        let mut result =
            ActionResult::ok(format!("Contract deployed successfully at {address}"))
                .with_tx_hash(format!("{hash:#x}"));
        result.contract_address = Some(address);
        Ok(result)
    }

    async fn call_contract(
        &self,
        contract_address: &str,
        abi_json: &serde_json::Value,
        method: &str,
        params: &[serde_json::Value],
        value: Option<&str>,
    ) -> Result<ActionResult> {
        let to = parse_address(contract_address)?;
        let abi = abi::parse_abi(abi_json)?;
        let calldata = abi::encode_call(&abi, method, params)?;
        let wei = match value {
            Some(v) => units::parse_eth(v)?,
            None => U256::ZERO,
        };

        let hash = self
            .wallet
            .send_transaction(TxRequest::call(to, calldata, wei))
            .await?;
        let receipt = self.wallet.wait_for_confirmation(hash).await?;

        info!(method, tx_hash = %hash, "contract call confirmed");
        let mut result = ActionResult::ok(format!(
            "Successfully called {method} on contract {contract_address}"
        ))
        .with_tx_hash(format!("{hash:#x}"));
        result.gas_used = Some(receipt.gas_used.to_string());
        Ok(result)
    }

    async fn get_balance(&self, address: Option<&str>) -> Result<ActionResult> {
        let target = match address {
            Some(a) => Some(parse_address(a)?),
            None => None,
        };

        let balance = self.wallet.get_balance(target).await?;
        let shown = match target {
            Some(a) => a.to_checksum(None),
            None => self
                .wallet
                .state()
                .await
                .account
                .map(|a| a.to_checksum(None))
                .unwrap_or_default(),
        };

        let mut result = ActionResult::ok(format!("Balance: {balance} ETH"));
        result.balance = Some(balance);
        result.address = Some(shown);
        Ok(result)
    }
}

fn parse_address(address: &str) -> std::result::Result<Address, ValidationError> {
    address
        .parse()
        .map_err(|e| ValidationError::Address(format!("{address}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use serde_json::json;
    use std::time::Duration;

    const RECIPIENT: &str = "0x2222222222222222222222222222222222222222";

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    async fn connected_executor(provider: &Arc<MockProvider>) -> ActionExecutor {
        let adapter = WalletAdapter::new(Arc::clone(provider) as Arc<dyn crate::provider::WalletProvider>)
            .with_confirmation_policy(Duration::from_millis(1), 3);
        adapter.connect().await.unwrap();
        ActionExecutor::new(Arc::new(adapter))
    }

    fn transfer(amount: &str) -> ActionDescriptor {
        ActionDescriptor::TransferEth {
            recipient: RECIPIENT.to_string(),
            amount: amount.into(),
        }
    }

    #[tokio::test]
    async fn test_transfer_success() {
        // Scenario A: connected wallet confirms the transaction.
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        let executor = connected_executor(&provider).await;

        let result = executor.execute(&transfer("0.01")).await;
        assert!(result.success);
        assert!(result.message.contains("0.01 ETH"));
        assert!(result.tx_hash.as_deref().is_some_and(|h| !h.is_empty()));
        assert_eq!(provider.send_calls(), 1);
    }

    #[tokio::test]
    async fn test_transfer_not_connected() {
        // Scenario B: no session means no wallet call at all.
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        let adapter = WalletAdapter::new(Arc::clone(&provider) as Arc<dyn crate::provider::WalletProvider>);
        let executor = ActionExecutor::new(Arc::new(adapter));

        let result = executor.execute(&transfer("0.01")).await;
        assert!(!result.success);
        assert_eq!(result.message, NOT_CONNECTED_MESSAGE);
        assert_eq!(provider.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_transfer_rejects_non_positive_amount() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        let executor = connected_executor(&provider).await;

        let result = executor.execute(&transfer("0")).await;
        assert!(!result.success);
        assert!(result.tx_hash.is_none());
        assert_eq!(provider.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_transfer_rejects_bad_address() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        let executor = connected_executor(&provider).await;

        let action = ActionDescriptor::TransferEth {
            recipient: "not-an-address".to_string(),
            amount: "1".into(),
        };
        let result = executor.execute(&action).await;
        assert!(!result.success);
        assert_eq!(provider.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_transfer_wallet_failure_becomes_result() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        provider.set_send_error("insufficient funds");
        let executor = connected_executor(&provider).await;

        let result = executor.execute(&transfer("0.01")).await;
        assert!(!result.success);
        assert!(result.message.contains("insufficient funds"));
        assert!(result.tx_hash.is_none());
    }

    #[tokio::test]
    async fn test_get_balance_never_signs() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        provider.set_balance(addr(1), "2.5");
        let executor = connected_executor(&provider).await;

        let result = executor
            .execute(&ActionDescriptor::GetBalance { address: None })
            .await;
        assert!(result.success);
        assert_eq!(result.balance.as_deref(), Some("2.5000"));
        assert!(result.message.contains("2.5000 ETH"));
        assert_eq!(provider.sign_calls(), 0);
        assert_eq!(provider.send_calls(), 0);
        assert_eq!(provider.counters().balance_calls, 1);
    }

    #[tokio::test]
    async fn test_deploy_contract_returns_address() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        provider.set_contract_address(addr(9));
        let executor = connected_executor(&provider).await;

        let action = ActionDescriptor::DeployContract {
            bytecode: "0x6001600101".to_string(),
            abi: json!([]),
            constructor_args: vec![],
            contract_name: None,
        };
        let result = executor.execute(&action).await;
        assert!(result.success, "{}", result.message);
        assert!(result.contract_address.is_some());
        assert!(result.tx_hash.is_some());

        // Creation transaction has no recipient.
        let tx = provider.last_tx().unwrap();
        assert!(tx.to.is_none());
    }

    #[tokio::test]
    async fn test_call_contract_reports_gas() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        let executor = connected_executor(&provider).await;

        let action = ActionDescriptor::CallContract {
            contract_address: RECIPIENT.to_string(),
            abi: json!([
                {
                    "type": "function",
                    "name": "ping",
                    "inputs": [],
                    "outputs": [],
                    "stateMutability": "nonpayable"
                }
            ]),
            method: "ping".to_string(),
            params: vec![],
            value: None,
        };
        let result = executor.execute(&action).await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.gas_used.as_deref(), Some("21000"));
        assert!(result.message.contains("ping"));
    }

    #[tokio::test]
    async fn test_single_flight_guard() {
        let provider = Arc::new(MockProvider::new(vec![addr(1)], "0x1"));
        let executor = connected_executor(&provider).await;

        let _held = executor.flight.try_lock().unwrap();
        let result = executor.execute(&transfer("0.01")).await;
        assert!(!result.success);
        assert_eq!(result.message, BUSY_MESSAGE);
        assert_eq!(provider.send_calls(), 0);
    }
}
