use std::str::FromStr;

use bitcoin::Network;

use crate::error::BtcError;

/// Default Esplora endpoint for Bitcoin mainnet.
pub const MAINNET_EXPLORER: &str = "https://blockstream.info/api";

/// Default Esplora endpoint for Bitcoin testnet.
pub const TESTNET_EXPLORER: &str = "https://blockstream.info/testnet/api";

/// Default Esplora endpoint for Bitcoin signet.
pub const SIGNET_EXPLORER: &str = "https://mempool.space/signet/api";

/// Supported Bitcoin networks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BtcNetwork {
    #[default]
    Mainnet,
    Testnet,
    Signet,
}

impl BtcNetwork {
    /// Convert to the `bitcoin` crate's `Network` type.
    pub fn to_bitcoin_network(self) -> Network {
        match self {
            BtcNetwork::Mainnet => Network::Bitcoin,
            BtcNetwork::Testnet => Network::Testnet,
            BtcNetwork::Signet => Network::Signet,
        }
    }

    /// Return the default block explorer endpoint for this network.
    pub fn default_explorer_url(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => MAINNET_EXPLORER,
            BtcNetwork::Testnet => TESTNET_EXPLORER,
            BtcNetwork::Signet => SIGNET_EXPLORER,
        }
    }
}

impl std::fmt::Display for BtcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BtcNetwork::Mainnet => write!(f, "mainnet"),
            BtcNetwork::Testnet => write!(f, "testnet"),
            BtcNetwork::Signet => write!(f, "signet"),
        }
    }
}

impl FromStr for BtcNetwork {
    type Err = BtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(BtcNetwork::Mainnet),
            "testnet" => Ok(BtcNetwork::Testnet),
            "signet" => Ok(BtcNetwork::Signet),
            other => Err(BtcError::InvalidNetwork(other.to_string())),
        }
    }
}
