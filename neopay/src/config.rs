//! Runtime configuration, loaded from the environment.

use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable names.
pub const ENV_API_URL: &str = "NEOPAY_API_URL";
pub const ENV_RPC_URL: &str = "NEOPAY_RPC_URL";
pub const ENV_PRIVATE_KEY: &str = "NEOPAY_PRIVATE_KEY";
pub const ENV_CHAIN_ID: &str = "NEOPAY_CHAIN_ID";
pub const ENV_CONFIRM_INTERVAL_SECS: &str = "NEOPAY_CONFIRM_INTERVAL_SECS";
pub const ENV_CONFIRM_ATTEMPTS: &str = "NEOPAY_CONFIRM_ATTEMPTS";

/// Backend URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default confirmation polling interval.
pub const DEFAULT_CONFIRM_INTERVAL: Duration = Duration::from_secs(2);

/// Default confirmation polling attempts.
pub const DEFAULT_CONFIRM_ATTEMPTS: u32 = 60;

/// Assistant runtime configuration.
///
/// The wallet settings are optional: without a key and RPC endpoint the
/// assistant still chats and reports status, with wallet operations
/// reporting the wallet as unavailable.
#[derive(Clone)]
pub struct NeoPayConfig {
    /// Backend base URL.
    pub api_url: String,
    /// JSON-RPC endpoint for the local wallet.
    pub rpc_url: Option<String>,
    /// Hex private key for the local wallet.
    pub private_key: Option<String>,
    /// Chain id override; auto-detected from RPC when absent.
    pub chain_id: Option<u64>,
    /// Polling interval while waiting for transaction confirmations.
    pub confirm_interval: Duration,
    /// Polls before a confirmation wait times out.
    pub confirm_attempts: u32,
}

impl Default for NeoPayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            rpc_url: None,
            private_key: None,
            chain_id: None,
            confirm_interval: DEFAULT_CONFIRM_INTERVAL,
            confirm_attempts: DEFAULT_CONFIRM_ATTEMPTS,
        }
    }
}

// Keeps the private key out of logs and error output.
impl std::fmt::Debug for NeoPayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeoPayConfig")
            .field("api_url", &self.api_url)
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("chain_id", &self.chain_id)
            .field("confirm_interval", &self.confirm_interval)
            .field("confirm_attempts", &self.confirm_attempts)
            .finish()
    }
}

impl NeoPayConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let chain_id = match lookup(ENV_CHAIN_ID) {
            Some(raw) => Some(parse_chain_id(&raw)?),
            None => None,
        };
        let confirm_interval = match lookup(ENV_CONFIRM_INTERVAL_SECS) {
            Some(raw) => Duration::from_secs(parse_number(ENV_CONFIRM_INTERVAL_SECS, &raw)?),
            None => DEFAULT_CONFIRM_INTERVAL,
        };
        let confirm_attempts = match lookup(ENV_CONFIRM_ATTEMPTS) {
            Some(raw) => parse_number(ENV_CONFIRM_ATTEMPTS, &raw)?,
            None => DEFAULT_CONFIRM_ATTEMPTS,
        };

        Ok(Self {
            api_url: lookup(ENV_API_URL)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            rpc_url: lookup(ENV_RPC_URL).filter(|v| !v.is_empty()),
            private_key: lookup(ENV_PRIVATE_KEY).filter(|v| !v.is_empty()),
            chain_id,
            confirm_interval,
            confirm_attempts,
        })
    }

    /// Whether a local wallet can be constructed from this configuration.
    #[must_use]
    pub const fn has_wallet(&self) -> bool {
        self.rpc_url.is_some() && self.private_key.is_some()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ConfigError::invalid(name, format!("'{raw}': {e}")))
}

/// Accepts decimal (`84532`) or hex (`0x14a34`) chain ids.
fn parse_chain_id(raw: &str) -> Result<u64, ConfigError> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| ConfigError::invalid(ENV_CHAIN_ID, format!("'{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = NeoPayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.rpc_url.is_none());
        assert!(!config.has_wallet());
    }

    #[test]
    fn test_full_configuration() {
        let config = NeoPayConfig::from_lookup(|name| match name {
            ENV_API_URL => Some("https://api.example.com".to_string()),
            ENV_RPC_URL => Some("https://sepolia.base.org".to_string()),
            ENV_PRIVATE_KEY => Some("0xabc123".to_string()),
            ENV_CHAIN_ID => Some("0x14a34".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert!(config.has_wallet());
        assert_eq!(config.chain_id, Some(84_532));
    }

    #[test]
    fn test_decimal_chain_id() {
        let config = NeoPayConfig::from_lookup(|name| {
            (name == ENV_CHAIN_ID).then(|| "84532".to_string())
        })
        .unwrap();
        assert_eq!(config.chain_id, Some(84_532));
    }

    #[test]
    fn test_confirmation_policy_overrides() {
        let config = NeoPayConfig::from_lookup(|name| match name {
            ENV_CONFIRM_INTERVAL_SECS => Some("5".to_string()),
            ENV_CONFIRM_ATTEMPTS => Some("12".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.confirm_interval, Duration::from_secs(5));
        assert_eq!(config.confirm_attempts, 12);
    }

    #[test]
    fn test_invalid_chain_id() {
        let err = NeoPayConfig::from_lookup(|name| {
            (name == ENV_CHAIN_ID).then(|| "not-a-number".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = NeoPayConfig {
            private_key: Some("0xsecret".to_string()),
            ..NeoPayConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }
}
