use bitcoin::absolute::LockTime;
use bitcoin::address::Address;
use bitcoin::consensus::encode;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, ScriptBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{ecdsa, Amount, Sequence, Transaction, TxIn, TxOut, Txid, Witness};

use crate::error::BtcError;
use crate::keys::TxSigner;
use crate::network::BtcNetwork;
use crate::utxo::Utxo;

/// Estimated size of a signed P2PKH input (in vbytes).
///
/// Deliberately generous compared to the ~148 bytes of a real input.
pub const INPUT_VBYTES: u64 = 180;

/// Estimated size of a P2PKH output (in vbytes).
pub const OUTPUT_VBYTES: u64 = 34;

/// Fixed transaction overhead (in vbytes): version + locktime + counts.
pub const TX_OVERHEAD_VBYTES: u64 = 10;

/// Estimate the virtual size of a legacy P2PKH transaction.
pub fn estimate_vsize(num_inputs: usize, num_outputs: usize) -> Option<u64> {
    (num_inputs as u64)
        .checked_mul(INPUT_VBYTES)?
        .checked_add((num_outputs as u64).checked_mul(OUTPUT_VBYTES)?)?
        .checked_add(TX_OVERHEAD_VBYTES)
}

/// Estimate the fee for a legacy P2PKH transaction: `vsize * fee_rate`.
pub fn estimate_fee(
    num_inputs: usize,
    num_outputs: usize,
    fee_rate_sat_vbyte: u64,
) -> Result<u64, BtcError> {
    estimate_vsize(num_inputs, num_outputs)
        .and_then(|vsize| vsize.checked_mul(fee_rate_sat_vbyte))
        .ok_or_else(|| {
            BtcError::TransactionBuildError(format!(
                "fee estimate overflows for {num_inputs} inputs at {fee_rate_sat_vbyte} sat/vbyte"
            ))
        })
}

/// A transaction whose inputs and outputs are fixed but not yet signed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedTransaction {
    tx: Transaction,
}

impl UnsignedTransaction {
    pub fn inputs(&self) -> &[TxIn] {
        &self.tx.input
    }

    pub fn outputs(&self) -> &[TxOut] {
        &self.tx.output
    }
}

/// A fully signed transaction: every input carries a P2PKH unlocking script.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    tx: Transaction,
}

impl SignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn inputs(&self) -> &[TxIn] {
        &self.tx.input
    }

    pub fn outputs(&self) -> &[TxOut] {
        &self.tx.output
    }

    pub fn output_count(&self) -> usize {
        self.tx.output.len()
    }

    pub fn txid(&self) -> Txid {
        self.tx.compute_txid()
    }

    /// Consensus wire encoding.
    pub fn serialize(&self) -> Vec<u8> {
        encode::serialize(&self.tx)
    }

    /// Hex of [`SignedTransaction::serialize`], as accepted by `POST /tx`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Decode a wire-format transaction, requiring every input to be signed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, BtcError> {
        let tx: Transaction =
            encode::deserialize(bytes).map_err(|e| BtcError::Decode(e.to_string()))?;

        if tx.input.is_empty() {
            return Err(BtcError::Decode("transaction has no inputs".into()));
        }
        if let Some(index) = tx.input.iter().position(|i| i.script_sig.is_empty()) {
            return Err(BtcError::Decode(format!("input {index} is unsigned")));
        }
        Ok(Self { tx })
    }

    pub fn from_hex(s: &str) -> Result<Self, BtcError> {
        let bytes = hex::decode(s.trim()).map_err(|e| BtcError::Decode(format!("bad hex: {e}")))?;
        Self::deserialize(&bytes)
    }
}

/// Builds and signs single-recipient legacy P2PKH transactions.
#[derive(Debug, Clone, Copy)]
pub struct TransactionBuilder {
    network: BtcNetwork,
}

impl TransactionBuilder {
    pub fn new(network: BtcNetwork) -> Self {
        Self { network }
    }

    /// Assemble and sign a transaction spending `selected`.
    ///
    /// The payment output comes first; the change output is appended only
    /// when `change_sat > 0`. The difference between the inputs and the
    /// outputs is the fee.
    pub fn build(
        &self,
        selected: &[Utxo],
        to: &Address,
        payment_sat: u64,
        change_address: &Address,
        change_sat: u64,
        signer: &impl TxSigner,
    ) -> Result<SignedTransaction, BtcError> {
        let unsigned = self.assemble(selected, to, payment_sat, change_address, change_sat)?;
        self.sign(&unsigned, signer)
    }

    /// Fix the input and output structure without signing.
    pub fn assemble(
        &self,
        selected: &[Utxo],
        to: &Address,
        payment_sat: u64,
        change_address: &Address,
        change_sat: u64,
    ) -> Result<UnsignedTransaction, BtcError> {
        if selected.is_empty() {
            return Err(BtcError::TransactionBuildError("no inputs selected".into()));
        }

        let net = self.network.to_bitcoin_network();
        for (role, addr) in [("recipient", to), ("change", change_address)] {
            if !addr.as_unchecked().is_valid_for_network(net) {
                return Err(BtcError::InvalidAddress(format!(
                    "{role} address {addr} is not valid for {}",
                    self.network
                )));
            }
        }

        let input_total = selected.iter().try_fold(0u64, |acc, u| acc.checked_add(u.value));
        let output_total = payment_sat.checked_add(change_sat);
        match (input_total, output_total) {
            (Some(inputs), Some(outputs)) if inputs >= outputs => {}
            _ => {
                return Err(BtcError::TransactionBuildError(format!(
                    "outputs ({payment_sat} + {change_sat} sat) exceed inputs ({input_total:?} sat)"
                )))
            }
        }

        let input = selected
            .iter()
            .map(|utxo| TxIn {
                previous_output: utxo.outpoint(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            })
            .collect();

        let mut output = vec![TxOut {
            value: Amount::from_sat(payment_sat),
            script_pubkey: to.script_pubkey(),
        }];
        if change_sat > 0 {
            output.push(TxOut {
                value: Amount::from_sat(change_sat),
                script_pubkey: change_address.script_pubkey(),
            });
        }

        Ok(UnsignedTransaction {
            tx: Transaction {
                version: Version::TWO,
                lock_time: LockTime::ZERO,
                input,
                output,
            },
        })
    }

    /// Sign every input of `unsigned` with `signer`, in index order.
    ///
    /// All sighashes are computed against the frozen unsigned structure.
    /// Any failure aborts the whole pass.
    pub fn sign(
        &self,
        unsigned: &UnsignedTransaction,
        signer: &impl TxSigner,
    ) -> Result<SignedTransaction, BtcError> {
        let secp = Secp256k1::verification_only();
        let public_key = signer.public_key();
        let script_code = ScriptBuf::new_p2pkh(&public_key.pubkey_hash());
        let cache = SighashCache::new(&unsigned.tx);

        let mut script_sigs = Vec::with_capacity(unsigned.tx.input.len());
        for input_index in 0..unsigned.tx.input.len() {
            let sighash = cache
                .legacy_signature_hash(input_index, &script_code, EcdsaSighashType::All.to_u32())
                .map_err(|e| {
                    BtcError::SigningError(format!("sighash for input {input_index}: {e}"))
                })?;

            let digest = sighash.to_byte_array();
            let signature = signer.sign_digest(digest)?;
            secp.verify_ecdsa(&Message::from_digest(digest), &signature, &public_key.0)
                .map_err(|e| {
                    BtcError::SigningError(format!(
                        "signature for input {input_index} does not match the signer's key: {e}"
                    ))
                })?;

            let sig = ecdsa::Signature {
                signature,
                sighash_type: EcdsaSighashType::All,
            };
            script_sigs.push(
                Builder::new()
                    .push_slice(sig.serialize())
                    .push_key(&bitcoin::PublicKey::new(public_key.0))
                    .into_script(),
            );
        }

        let mut tx = unsigned.tx.clone();
        for (input, script_sig) in tx.input.iter_mut().zip(script_sigs) {
            input.script_sig = script_sig;
        }
        Ok(SignedTransaction { tx })
    }
}
