//! Balance and send operations composed from keys, selection, building and
//! the explorer boundary.

use bitcoin::{Address, Txid};
use chain_btc::address::{derive_address, parse_address};
use chain_btc::keys::{derive_public_key, parse_public_key_hex, public_key_hex};
use chain_btc::{KeyPair, PrivateKey, PublicKey, TransactionBuilder, TxSigner, UtxoSelector};
use tracing::{debug, info, warn};

use crate::amount::btc_to_sat;
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::explorer::ChainDataClient;
use crate::key_store::PublicKeyStore;

/// Public half of a wallet: key and its P2PKH address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    pub public_key: PublicKey,
    pub address: Address,
}

impl WalletIdentity {
    pub fn public_key_hex(&self) -> String {
        public_key_hex(&self.public_key)
    }
}

/// Wallet operations over a chain data source and a public key store.
///
/// Holds no per-operation state: every `send` takes a fresh UTXO snapshot
/// and fee estimate. Concurrent sends from the same key are not
/// coordinated and may pick overlapping UTXOs.
pub struct Wallet<C, S> {
    client: C,
    store: S,
    config: WalletConfig,
    selector: UtxoSelector,
    builder: TransactionBuilder,
}

impl<C: ChainDataClient, S: PublicKeyStore> Wallet<C, S> {
    pub fn new(client: C, store: S, config: WalletConfig) -> Self {
        let builder = TransactionBuilder::new(config.network);
        Self {
            client,
            store,
            config,
            selector: UtxoSelector,
            builder,
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn identity_for(&self, private_key: &PrivateKey) -> Result<WalletIdentity, WalletError> {
        let public_key = derive_public_key(private_key)?;
        self.identity_for_public_key(public_key)
    }

    pub fn identity_for_public_key(
        &self,
        public_key: PublicKey,
    ) -> Result<WalletIdentity, WalletError> {
        let address = derive_address(&public_key, self.config.network)?;
        Ok(WalletIdentity {
            public_key,
            address,
        })
    }

    /// Derive the identity for `private_key` and persist its public key.
    pub fn initialize(&self, private_key: &PrivateKey) -> Result<WalletIdentity, WalletError> {
        let identity = self.identity_for(private_key)?;
        self.store.save(&identity.public_key_hex())?;
        info!(address = %identity.address, "wallet initialized");
        Ok(identity)
    }

    /// The identity of the last initialized wallet, if any.
    pub fn stored_identity(&self) -> Result<Option<WalletIdentity>, WalletError> {
        match self.store.load()? {
            Some(hex) => {
                let public_key = parse_public_key_hex(&hex)?;
                self.identity_for_public_key(public_key).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Confirmed balance of `address` in satoshis.
    pub async fn get_balance(&self, address: &Address) -> Result<u64, WalletError> {
        let balance = self.client.fetch_balance(address).await?;
        debug!(%address, balance, "fetched balance");
        Ok(balance)
    }

    /// Send `amount_btc` to `to`, paying change back to the sender.
    ///
    /// The amount is converted with [`btc_to_sat`] (nearest satoshi).
    pub async fn send(
        &self,
        private_key: PrivateKey,
        to: &str,
        amount_btc: f64,
    ) -> Result<Txid, WalletError> {
        let amount_sat = btc_to_sat(amount_btc)?;
        self.send_sat(private_key, to, amount_sat).await
    }

    /// Send `amount_sat` satoshis to `to`.
    ///
    /// Any failure aborts before broadcast; nothing is retried.
    pub async fn send_sat(
        &self,
        private_key: PrivateKey,
        to: &str,
        amount_sat: u64,
    ) -> Result<Txid, WalletError> {
        if amount_sat == 0 {
            return Err(WalletError::InvalidAmount("amount must be greater than zero".into()));
        }

        let signer = KeyPair::new(private_key)?;
        let from = derive_address(&signer.public_key(), self.config.network)?;
        let recipient = parse_address(to, self.config.network)?;
        info!(%from, to = %recipient, amount_sat, "preparing payment");

        let utxos = self.client.fetch_utxos(&from).await?;
        if utxos.is_empty() {
            return Err(WalletError::InsufficientFunds {
                address: from.to_string(),
                available: 0,
                required: amount_sat,
            });
        }

        let fee_rate = self
            .client
            .fetch_fee_estimate(self.config.fee_target_blocks)
            .await?;

        let selection = self
            .selector
            .select(&utxos, amount_sat, fee_rate)
            .map_err(|e| WalletError::from_selection(e, &from.to_string()))?;
        let change = selection.change_for(amount_sat).ok_or_else(|| {
            WalletError::TransactionFailed(format!(
                "selection total {} does not cover {amount_sat} + fee {}",
                selection.total, selection.fee
            ))
        })?;
        debug!(
            inputs = selection.selected.len(),
            available = utxos.len(),
            fee_rate,
            fee = selection.fee,
            change,
            "selected inputs"
        );

        let tx = self.builder.build(
            &selection.selected,
            &recipient,
            amount_sat,
            &from,
            change,
            &signer,
        )?;

        let txid = self.client.broadcast(&tx.to_hex()).await?;
        if txid != tx.txid() {
            warn!(reported = %txid, computed = %tx.txid(), "explorer returned a different txid");
        }
        info!(%txid, fee = selection.fee, "transaction broadcast");
        Ok(txid)
    }
}
