//! Block explorer boundary.
//!
//! [`ChainDataClient`] is everything the wallet needs from the chain;
//! [`EsploraClient`] implements it over the Esplora REST API
//! (blockstream.info, mempool.space, self-hosted electrs).

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::{Address, Txid};
use chain_btc::Utxo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::WalletConfig;
use crate::error::WalletError;

/// Chain data the wallet depends on.
///
/// Every method fails with [`WalletError::Network`] on transport errors,
/// non-success responses, undecodable bodies, and timeouts. Nothing is
/// retried.
#[async_trait]
pub trait ChainDataClient: Send + Sync {
    /// Full unspent set for `address`. An empty list means zero balance.
    async fn fetch_utxos(&self, address: &Address) -> Result<Vec<Utxo>, WalletError>;

    /// Confirmed funded minus spent total for `address`, in satoshis.
    async fn fetch_balance(&self, address: &Address) -> Result<u64, WalletError>;

    /// Fee rate in sat/vbyte for confirmation within `target_blocks`,
    /// rounded up to a whole satoshi.
    async fn fetch_fee_estimate(&self, target_blocks: u16) -> Result<u64, WalletError>;

    /// Submit a signed, hex-encoded transaction and return its txid.
    async fn broadcast(&self, raw_tx_hex: &str) -> Result<Txid, WalletError>;
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    chain_stats: ChainStats,
}

#[derive(Debug, Deserialize)]
struct ChainStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

#[derive(Debug, Deserialize)]
struct EsploraUtxo {
    txid: String,
    vout: u32,
    value: u64,
}

/// Pick the rate for `target_blocks` out of a `/fee-estimates` map.
///
/// Fractional rates are rounded up; the result is at least 1 sat/vbyte.
pub fn rate_for_target(
    estimates: &HashMap<String, f64>,
    target_blocks: u16,
) -> Result<u64, WalletError> {
    const STEP: &str = "fetch_fee_estimate";

    let rate = estimates
        .get(&target_blocks.to_string())
        .copied()
        .ok_or_else(|| {
            WalletError::network(STEP, format!("no estimate for a {target_blocks}-block target"))
        })?;

    if !rate.is_finite() || rate < 0.0 {
        return Err(WalletError::network(STEP, format!("unusable fee rate {rate}")));
    }
    Ok((rate.ceil() as u64).max(1))
}

/// Esplora REST client.
pub struct EsploraClient {
    base_url: String,
    http: reqwest::Client,
}

impl EsploraClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Self::new(&config.explorer_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_body(
        step: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, WalletError> {
        let response = request
            .send()
            .await
            .map_err(|e| WalletError::network(step, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::network(step, e))?;

        if !status.is_success() {
            return Err(WalletError::network(
                step,
                format!("HTTP {status}: {}", body.trim()),
            ));
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        step: &'static str,
        path: &str,
    ) -> Result<T, WalletError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, step, "GET");

        let body = Self::read_body(step, self.http.get(&url)).await?;
        serde_json::from_str(&body)
            .map_err(|e| WalletError::network(step, format!("malformed response: {e}")))
    }
}

#[async_trait]
impl ChainDataClient for EsploraClient {
    async fn fetch_utxos(&self, address: &Address) -> Result<Vec<Utxo>, WalletError> {
        const STEP: &str = "fetch_utxos";

        let raw: Vec<EsploraUtxo> = self.get_json(STEP, &format!("/address/{address}/utxo")).await?;
        raw.into_iter()
            .map(|u| {
                let txid = Txid::from_str(&u.txid).map_err(|e| {
                    WalletError::network(STEP, format!("malformed txid {:?}: {e}", u.txid))
                })?;
                Ok(Utxo {
                    txid,
                    vout: u.vout,
                    value: u.value,
                })
            })
            .collect()
    }

    async fn fetch_balance(&self, address: &Address) -> Result<u64, WalletError> {
        let info: AddressInfo = self
            .get_json("fetch_balance", &format!("/address/{address}"))
            .await?;
        Ok(info
            .chain_stats
            .funded_txo_sum
            .saturating_sub(info.chain_stats.spent_txo_sum))
    }

    async fn fetch_fee_estimate(&self, target_blocks: u16) -> Result<u64, WalletError> {
        let estimates: HashMap<String, f64> =
            self.get_json("fetch_fee_estimate", "/fee-estimates").await?;
        rate_for_target(&estimates, target_blocks)
    }

    async fn broadcast(&self, raw_tx_hex: &str) -> Result<Txid, WalletError> {
        const STEP: &str = "broadcast";

        let url = format!("{}/tx", self.base_url);
        debug!(%url, bytes = raw_tx_hex.len() / 2, "POST");

        let request = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(raw_tx_hex.to_string());
        let body = Self::read_body(STEP, request).await?;

        Txid::from_str(body.trim())
            .map_err(|e| WalletError::network(STEP, format!("unexpected response {body:?}: {e}")))
    }
}
