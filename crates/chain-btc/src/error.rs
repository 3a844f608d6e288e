use thiserror::Error;

/// Bitcoin chain operation errors.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("address derivation failed: {0}")]
    AddressDerivation(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("transaction decode error: {0}")]
    Decode(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),
}
