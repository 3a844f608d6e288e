//! Bitcoin chain support for the command-line wallet.
//!
//! Provides key generation, legacy P2PKH address derivation, fee-aware UTXO
//! selection, and building/signing of single-recipient transactions using
//! the legacy (pre-SegWit) sighash algorithm.

pub mod address;
pub mod error;
pub mod keys;
pub mod network;
pub mod transaction;
pub mod utxo;

pub use error::BtcError;
pub use keys::{KeyPair, PrivateKey, PublicKey, TxSigner};
pub use network::BtcNetwork;
pub use transaction::{SignedTransaction, TransactionBuilder};
pub use utxo::{Selection, Utxo, UtxoSelector};
