use bitcoin::{OutPoint, Txid};

use crate::error::BtcError;
use crate::transaction::estimate_fee;

/// Outputs assumed by the selector's size estimate: payment + change.
///
/// Held at two even when the change output is later omitted.
pub const ESTIMATED_OUTPUTS: usize = 2;

/// A single unspent transaction output (UTXO) owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// Transaction that created the output.
    pub txid: Txid,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }
}

/// Result of UTXO selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Selected UTXOs, in accumulation order.
    pub selected: Vec<Utxo>,
    /// Total value of the selected UTXOs in satoshis.
    pub total: u64,
    /// Fee for the selected input count at the requested rate.
    pub fee: u64,
}

impl Selection {
    /// Value left over after paying `payment` and the fee.
    ///
    /// `None` only if `payment` exceeds what the selection was made for.
    pub fn change_for(&self, payment: u64) -> Option<u64> {
        self.total.checked_sub(payment)?.checked_sub(self.fee)
    }
}

/// Greedy first-fit coin selection.
///
/// UTXOs are consumed in the order given; no sorting is performed, so the
/// result depends on the caller's ordering and does not minimise input count
/// or avoid dust.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtxoSelector;

impl UtxoSelector {
    /// Select UTXOs covering `target_sat` plus the fee at `fee_rate_sat_vbyte`.
    ///
    /// The fee is estimated for the current input count and
    /// [`ESTIMATED_OUTPUTS`] outputs after every addition, and selection stops
    /// as soon as `total >= target + fee`. The returned fee always matches the
    /// final input count.
    pub fn select(
        &self,
        utxos: &[Utxo],
        target_sat: u64,
        fee_rate_sat_vbyte: u64,
    ) -> Result<Selection, BtcError> {
        if utxos.is_empty() {
            return Err(BtcError::InsufficientFunds {
                available: 0,
                required: target_sat,
            });
        }

        let mut selected: Vec<Utxo> = Vec::new();
        let mut total: u64 = 0;

        for utxo in utxos {
            selected.push(utxo.clone());
            total = total
                .checked_add(utxo.value)
                .ok_or(Self::unaffordable(total))?;

            let fee = estimate_fee(selected.len(), ESTIMATED_OUTPUTS, fee_rate_sat_vbyte)
                .map_err(|_| Self::unaffordable(total))?;
            if total >= target_sat.saturating_add(fee) {
                break;
            }
        }

        let fee = estimate_fee(selected.len(), ESTIMATED_OUTPUTS, fee_rate_sat_vbyte)
            .map_err(|_| Self::unaffordable(total))?;
        let required = target_sat
            .checked_add(fee)
            .ok_or(Self::unaffordable(total))?;

        if total < required {
            return Err(BtcError::InsufficientFunds {
                available: total,
                required,
            });
        }

        Ok(Selection {
            selected,
            total,
            fee,
        })
    }

    /// Requirement too large for `u64`: no UTXO set can meet it.
    fn unaffordable(available: u64) -> BtcError {
        BtcError::InsufficientFunds {
            available,
            required: u64::MAX,
        }
    }
}
