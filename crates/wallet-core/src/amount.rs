use crate::error::WalletError;

/// Satoshis per bitcoin.
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Upper bound on any amount: 21 million BTC.
pub const MAX_MONEY_SAT: u64 = 21_000_000 * SATS_PER_BTC;

/// Convert a BTC amount to satoshis as `round(amount * 1e8)`.
///
/// Rounds to the nearest satoshi, halves away from zero. Rejects NaN,
/// infinities, negative values, and anything above 21 million BTC.
pub fn btc_to_sat(amount_btc: f64) -> Result<u64, WalletError> {
    if !amount_btc.is_finite() {
        return Err(WalletError::InvalidAmount(format!("{amount_btc} is not a number")));
    }
    if amount_btc < 0.0 {
        return Err(WalletError::InvalidAmount(format!("{amount_btc} is negative")));
    }

    let sats = (amount_btc * SATS_PER_BTC as f64).round();
    if sats > MAX_MONEY_SAT as f64 {
        return Err(WalletError::InvalidAmount(format!(
            "{amount_btc} BTC exceeds the 21M BTC supply"
        )));
    }
    Ok(sats as u64)
}

/// Satoshis as a decimal BTC amount, for display.
pub fn sat_to_btc(sats: u64) -> f64 {
    sats as f64 / SATS_PER_BTC as f64
}
