//! # wallet-core
//!
//! Balance lookups and single-recipient sends for a legacy P2PKH wallet,
//! on top of an Esplora-style block explorer.

pub mod amount;
pub mod config;
pub mod error;
pub mod explorer;
pub mod key_store;
pub mod wallet;

pub use config::WalletConfig;
pub use error::WalletError;
pub use explorer::{ChainDataClient, EsploraClient};
pub use key_store::{FileKeyStore, MemoryKeyStore, PublicKeyStore};
pub use wallet::{Wallet, WalletIdentity};
