//! Wallet configuration with defaults and environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use chain_btc::BtcNetwork;

use crate::error::WalletError;

/// Default file holding the hex public key of the initialized wallet.
pub const DEFAULT_KEY_FILE: &str = ".public_key";

/// Confirmation target (in blocks) used for fee estimates.
pub const DEFAULT_FEE_TARGET_BLOCKS: u16 = 1;

/// Per-request timeout for block explorer calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    /// Network addresses are derived and validated for.
    pub network: BtcNetwork,
    /// Esplora-compatible REST base URL, without trailing slash.
    pub explorer_url: String,
    /// Where the public key of the initialized wallet is kept.
    pub key_file: PathBuf,
    /// Confirmation target passed to the fee estimate lookup.
    pub fee_target_blocks: u16,
    pub request_timeout: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self::for_network(BtcNetwork::Mainnet)
    }
}

impl WalletConfig {
    /// Defaults for `network`, including its public explorer.
    pub fn for_network(network: BtcNetwork) -> Self {
        Self {
            network,
            explorer_url: network.default_explorer_url().to_string(),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            fee_target_blocks: DEFAULT_FEE_TARGET_BLOCKS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from `BTC_WALLET_*` environment variables.
    pub fn from_env() -> Result<Self, WalletError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// The explorer URL follows the network unless set explicitly.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WalletError> {
        let network = match lookup("BTC_WALLET_NETWORK") {
            Some(raw) => raw.parse::<BtcNetwork>()?,
            None => BtcNetwork::Mainnet,
        };
        let mut config = Self::for_network(network);

        if let Some(url) = lookup("BTC_WALLET_EXPLORER_URL") {
            config.explorer_url = url;
        }
        if let Some(path) = lookup("BTC_WALLET_KEY_FILE") {
            config.key_file = PathBuf::from(path);
        }
        if let Some(raw) = lookup("BTC_WALLET_FEE_TARGET") {
            config.fee_target_blocks = raw.trim().parse().map_err(|_| {
                WalletError::Config(format!("BTC_WALLET_FEE_TARGET must be a block count, got {raw:?}"))
            })?;
        }
        if let Some(raw) = lookup("BTC_WALLET_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                WalletError::Config(format!("BTC_WALLET_TIMEOUT_SECS must be seconds, got {raw:?}"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the wallet cannot operate with.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.fee_target_blocks == 0 {
            return Err(WalletError::Config("fee target must be at least 1 block".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(WalletError::Config("request timeout must be non-zero".into()));
        }
        if !(self.explorer_url.starts_with("http://") || self.explorer_url.starts_with("https://"))
        {
            return Err(WalletError::Config(format!(
                "explorer URL must be http(s): {}",
                self.explorer_url
            )));
        }
        Ok(())
    }
}
