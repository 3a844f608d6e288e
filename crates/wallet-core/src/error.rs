use chain_btc::BtcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Address derivation failed: {0}")]
    AddressDerivation(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds in {address}: have {available} sat, need {required} sat")]
    InsufficientFunds {
        address: String,
        available: u64,
        required: u64,
    },

    #[error("Network error during {step}: {detail}")]
    Network { step: &'static str, detail: String },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Transaction build failed: {0}")]
    TransactionFailed(String),

    #[error("Key store error: {0}")]
    KeyStore(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalletError {
    pub fn network(step: &'static str, detail: impl std::fmt::Display) -> Self {
        WalletError::Network {
            step,
            detail: detail.to_string(),
        }
    }

    /// Attach the spending address to a selection failure.
    pub(crate) fn from_selection(e: BtcError, address: &str) -> Self {
        match e {
            BtcError::InsufficientFunds {
                available,
                required,
            } => WalletError::InsufficientFunds {
                address: address.to_string(),
                available,
                required,
            },
            other => other.into(),
        }
    }
}

impl From<BtcError> for WalletError {
    fn from(e: BtcError) -> Self {
        match e {
            BtcError::InvalidKey(m) => WalletError::InvalidKey(m),
            BtcError::InvalidPublicKey(m) => WalletError::InvalidPublicKey(m),
            BtcError::AddressDerivation(m) => WalletError::AddressDerivation(m),
            BtcError::InvalidAddress(m) => WalletError::InvalidAddress(m),
            BtcError::InsufficientFunds {
                available,
                required,
            } => WalletError::InsufficientFunds {
                address: String::from("<unknown>"),
                available,
                required,
            },
            BtcError::SigningError(m) => WalletError::Signing(m),
            BtcError::InvalidNetwork(m) => WalletError::Config(format!("invalid network: {m}")),
            other @ (BtcError::TransactionBuildError(_) | BtcError::Decode(_)) => {
                WalletError::TransactionFailed(other.to_string())
            }
        }
    }
}
