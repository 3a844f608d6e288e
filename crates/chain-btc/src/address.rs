use bitcoin::address::{Address, AddressType, NetworkUnchecked};

use crate::error::BtcError;
use crate::keys::PublicKey;
use crate::network::BtcNetwork;

/// Derive a legacy P2PKH (Base58Check) address from a compressed public key.
///
/// Returns a `1...` address on mainnet and an `m...`/`n...` address on
/// testnet/signet. A valid key always yields an address; the
/// `AddressDerivation` error only reports an encoder that produced something
/// other than P2PKH.
pub fn derive_address(public_key: &PublicKey, network: BtcNetwork) -> Result<Address, BtcError> {
    let address = Address::p2pkh(public_key.pubkey_hash(), network.to_bitcoin_network());

    if address.address_type() != Some(AddressType::P2pkh) {
        return Err(BtcError::AddressDerivation(format!(
            "encoder produced non-P2PKH address {address}"
        )));
    }
    Ok(address)
}

/// Parse a destination address and require it to be P2PKH on `network`.
pub fn parse_address(address: &str, network: BtcNetwork) -> Result<Address, BtcError> {
    let checked = address
        .trim()
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("failed to parse {address:?}: {e}")))?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| BtcError::InvalidAddress(format!("{address} is not a {network} address: {e}")))?;

    match checked.address_type() {
        Some(AddressType::P2pkh) => Ok(checked),
        other => Err(BtcError::InvalidAddress(format!(
            "{address} is {other:?}, only P2PKH is supported"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{derive_public_key, PrivateKey};

    fn key_one_pubkey() -> PublicKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        derive_public_key(&PrivateKey::from_slice(&bytes).unwrap()).unwrap()
    }

    /// Private key 1 -> compressed generator point -> well-known P2PKH address.
    #[test]
    fn p2pkh_mainnet_test_vector() {
        let address = derive_address(&key_one_pubkey(), BtcNetwork::Mainnet).unwrap();
        assert_eq!(address.to_string(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
    }

    #[test]
    fn p2pkh_testnet_prefix() {
        let address = derive_address(&key_one_pubkey(), BtcNetwork::Testnet).unwrap();
        let s = address.to_string();
        assert!(s.starts_with('m') || s.starts_with('n'), "got {s}");
    }

    #[test]
    fn derivation_is_stable_across_calls() {
        let pk = derive_public_key(&PrivateKey::from_slice(&[0xcd; 32]).unwrap()).unwrap();
        let a = derive_address(&pk, BtcNetwork::Mainnet).unwrap();
        let b = derive_address(&pk, BtcNetwork::Mainnet).unwrap();
        assert_eq!(a, b);
        assert!(a.to_string().starts_with('1'));
    }

    #[test]
    fn parse_known_p2pkh_address() {
        // Genesis coinbase address.
        let addr = parse_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", BtcNetwork::Mainnet).unwrap();
        assert_eq!(addr.address_type(), Some(AddressType::P2pkh));
    }

    #[test]
    fn parse_rejects_wrong_network() {
        let err = parse_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", BtcNetwork::Testnet)
            .unwrap_err();
        assert!(matches!(err, BtcError::InvalidAddress(_)));
    }

    #[test]
    fn parse_rejects_segwit_destination() {
        let err = parse_address(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            BtcNetwork::Mainnet,
        )
        .unwrap_err();
        assert!(err.to_string().contains("only P2PKH"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_address("notanaddress!!!", BtcNetwork::Mainnet),
            Err(BtcError::InvalidAddress(_))
        ));
    }
}
