//! Decimal-ETH / wei conversions.

use alloy::primitives::U256;
use alloy::primitives::utils::{format_ether, parse_ether};

use crate::error::ValidationError;

/// Parse a decimal ETH amount string into wei.
pub fn parse_eth(amount: &str) -> Result<U256, ValidationError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Amount("empty amount".into()));
    }
    parse_ether(trimmed).map_err(|e| ValidationError::Amount(format!("{trimmed}: {e}")))
}

/// Parse a decimal ETH amount that must be strictly positive.
pub fn parse_positive_eth(amount: &str) -> Result<U256, ValidationError> {
    let wei = parse_eth(amount)?;
    if wei.is_zero() {
        return Err(ValidationError::Amount(format!(
            "amount must be greater than zero, got {amount}"
        )));
    }
    Ok(wei)
}

/// Format a wei amount as a fixed-point ETH string with 4 decimals.
#[must_use]
pub fn format_eth_4dp(wei: U256) -> String {
    let full = format_ether(wei);
    match full.split_once('.') {
        Some((whole, frac)) => {
            let mut frac = frac.to_string();
            frac.truncate(4);
            while frac.len() < 4 {
                frac.push('0');
            }
            format!("{whole}.{frac}")
        }
        None => format!("{full}.0000"),
    }
}

/// Format a wei amount as the full-precision decimal ETH string.
#[must_use]
pub fn format_eth(wei: U256) -> String {
    format_ether(wei)
}
