use bitcoin::secp256k1::{ecdsa::Signature, All, Message, Secp256k1, SecretKey};
use bitcoin::CompressedPublicKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::BtcError;

/// Compressed secp256k1 public key (33 bytes).
pub type PublicKey = CompressedPublicKey;

/// A validated secp256k1 private key.
///
/// Always holds a scalar in `[1, n)`; construction rejects anything else.
/// The bytes are wiped when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Generate a fresh key from the operating system CSPRNG.
    pub fn generate() -> Self {
        Self::generate_with(|| {
            let mut buf = [0u8; 32];
            OsRng.fill_bytes(&mut buf);
            buf
        })
    }

    /// Generate a key from `draw`, redrawing until a candidate is a valid
    /// secp256k1 scalar.
    pub fn generate_with(mut draw: impl FnMut() -> [u8; 32]) -> Self {
        loop {
            let mut candidate = draw();
            let valid = SecretKey::from_slice(&candidate).is_ok();
            if valid {
                let key = Self(candidate);
                candidate.zeroize();
                return key;
            }
            candidate.zeroize();
        }
    }

    /// Parse a raw 32-byte scalar.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BtcError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            BtcError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        SecretKey::from_slice(&arr).map_err(|_| {
            BtcError::InvalidKey("scalar is zero or not below the curve order".into())
        })?;
        Ok(Self(arr))
    }

    /// Parse a hex-encoded 32-byte scalar. Surrounding whitespace is ignored.
    pub fn from_hex(s: &str) -> Result<Self, BtcError> {
        let bytes = Zeroizing::new(
            hex::decode(s.trim()).map_err(|e| BtcError::InvalidKey(format!("bad hex: {e}")))?,
        );
        Self::from_slice(&bytes)
    }

    /// Lowercase hex encoding of the scalar.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn secret_key(&self) -> Result<SecretKey, BtcError> {
        SecretKey::from_slice(&self.0).map_err(|e| BtcError::InvalidKey(e.to_string()))
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Derive the compressed public key for `private_key`.
pub fn derive_public_key(private_key: &PrivateKey) -> Result<PublicKey, BtcError> {
    let secp = Secp256k1::signing_only();
    let secret_key = private_key.secret_key()?;
    let public_key = bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
    Ok(CompressedPublicKey(public_key))
}

/// Parse a hex-encoded 33-byte compressed public key.
pub fn parse_public_key_hex(s: &str) -> Result<PublicKey, BtcError> {
    let bytes = hex::decode(s.trim())
        .map_err(|e| BtcError::InvalidPublicKey(format!("bad hex: {e}")))?;
    CompressedPublicKey::from_slice(&bytes)
        .map_err(|e| BtcError::InvalidPublicKey(format!("not a compressed point: {e}")))
}

/// Hex encoding of a compressed public key.
pub fn public_key_hex(public_key: &PublicKey) -> String {
    hex::encode(public_key.to_bytes())
}

/// Signing capability used by the transaction builder.
///
/// Kept narrow so the builder can be exercised with any key source.
pub trait TxSigner {
    /// The public key whose P2PKH outputs this signer can spend.
    fn public_key(&self) -> PublicKey;

    /// Produce an ECDSA signature over a 32-byte sighash digest.
    fn sign_digest(&self, digest: [u8; 32]) -> Result<Signature, BtcError>;
}

/// A private key paired with its derived public key.
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
    secp: Secp256k1<All>,
}

impl KeyPair {
    pub fn new(private_key: PrivateKey) -> Result<Self, BtcError> {
        let public_key = derive_public_key(&private_key)?;
        Ok(Self {
            private_key,
            public_key,
            secp: Secp256k1::new(),
        })
    }
}

impl TxSigner for KeyPair {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Signs with RFC 6979 nonces, so the output is deterministic.
    fn sign_digest(&self, digest: [u8; 32]) -> Result<Signature, BtcError> {
        let secret_key = self
            .private_key
            .secret_key()
            .map_err(|e| BtcError::SigningError(e.to_string()))?;
        let msg = Message::from_digest(digest);
        Ok(self.secp.sign_ecdsa(&msg, &secret_key))
    }
}
