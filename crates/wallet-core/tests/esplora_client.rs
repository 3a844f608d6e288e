//! `EsploraClient` against an in-process HTTP server speaking the Esplora
//! REST shapes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chain_btc::address::{derive_address, parse_address};
use chain_btc::keys::derive_public_key;
use chain_btc::{BtcNetwork, PrivateKey, SignedTransaction};
use serde_json::{json, Value};
use wallet_core::{
    ChainDataClient, EsploraClient, FileKeyStore, Wallet, WalletConfig, WalletError,
};

const FUNDING_TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

type Posted = Arc<Mutex<Vec<String>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn address_info() -> Json<Value> {
    Json(json!({
        "address": "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH",
        "chain_stats": {
            "funded_txo_count": 2,
            "funded_txo_sum": 250000,
            "spent_txo_count": 1,
            "spent_txo_sum": 150000,
            "tx_count": 3
        },
        "mempool_stats": {
            "funded_txo_count": 0,
            "funded_txo_sum": 0,
            "spent_txo_count": 0,
            "spent_txo_sum": 0,
            "tx_count": 0
        }
    }))
}

async fn address_utxos() -> Json<Value> {
    Json(json!([
        {
            "txid": FUNDING_TXID,
            "vout": 0,
            "status": {"confirmed": true, "block_height": 800000},
            "value": 100000
        }
    ]))
}

async fn fee_estimates() -> Json<Value> {
    Json(json!({"1": 9.2, "2": 7.5, "6": 3.1, "144": 1.0}))
}

async fn post_tx(State(posted): State<Posted>, body: String) -> (StatusCode, String) {
    posted.lock().unwrap().push(body.clone());
    match SignedTransaction::from_hex(&body) {
        Ok(tx) => (StatusCode::OK, tx.txid().to_string()),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            format!("sendrawtransaction RPC error: {e}"),
        ),
    }
}

fn explorer(posted: Posted) -> Router {
    Router::new()
        .route("/address/:addr", get(address_info))
        .route("/address/:addr/utxo", get(address_utxos))
        .route("/fee-estimates", get(fee_estimates))
        .route("/tx", post(post_tx))
        .with_state(posted)
}

fn client(base: &str) -> EsploraClient {
    EsploraClient::new(base, Duration::from_secs(5)).unwrap()
}

fn sample_address() -> bitcoin::Address {
    parse_address("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH", BtcNetwork::Mainnet).unwrap()
}

#[tokio::test]
async fn fetches_utxos() {
    let base = serve(explorer(Posted::default())).await;

    let utxos = client(&base).fetch_utxos(&sample_address()).await.unwrap();

    assert_eq!(utxos.len(), 1);
    assert_eq!(utxos[0].txid.to_string(), FUNDING_TXID);
    assert_eq!(utxos[0].vout, 0);
    assert_eq!(utxos[0].value, 100_000);
}

#[tokio::test]
async fn balance_is_funded_minus_spent() {
    let base = serve(explorer(Posted::default())).await;

    let balance = client(&base).fetch_balance(&sample_address()).await.unwrap();
    assert_eq!(balance, 100_000);
}

#[tokio::test]
async fn fee_estimate_rounds_up() {
    let base = serve(explorer(Posted::default())).await;
    let c = client(&base);

    assert_eq!(c.fetch_fee_estimate(1).await.unwrap(), 10);
    assert_eq!(c.fetch_fee_estimate(6).await.unwrap(), 4);
    assert!(matches!(
        c.fetch_fee_estimate(3).await,
        Err(WalletError::Network { .. })
    ));
}

#[tokio::test]
async fn rejected_broadcast_is_network_error() {
    let posted = Posted::default();
    let base = serve(explorer(posted.clone())).await;

    let err = client(&base).broadcast("deadbeef").await.unwrap_err();

    match err {
        WalletError::Network { step, detail } => {
            assert_eq!(step, "broadcast");
            assert!(detail.contains("400"), "{detail}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(posted.lock().unwrap().as_slice(), ["deadbeef"]);
}

#[tokio::test]
async fn error_status_is_network_error() {
    let app = Router::new().route(
        "/address/:addr/utxo",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try again later") }),
    );
    let base = serve(app).await;

    let err = client(&base).fetch_utxos(&sample_address()).await.unwrap_err();

    match err {
        WalletError::Network { step, detail } => {
            assert_eq!(step, "fetch_utxos");
            assert!(detail.contains("503"), "{detail}");
            assert!(detail.contains("try again later"), "{detail}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_body_is_network_error() {
    let app = Router::new().route("/fee-estimates", get(|| async { "not json" }));
    let base = serve(app).await;

    let err = client(&base).fetch_fee_estimate(1).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::Network {
            step: "fetch_fee_estimate",
            ..
        }
    ));
}

#[tokio::test]
async fn slow_explorer_times_out() {
    let app = Router::new().route(
        "/address/:addr",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    );
    let base = serve(app).await;
    let c = EsploraClient::new(&base, Duration::from_millis(200)).unwrap();

    let err = c.fetch_balance(&sample_address()).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::Network {
            step: "fetch_balance",
            ..
        }
    ));
}

#[tokio::test]
async fn unreachable_explorer_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"))
        .fetch_balance(&sample_address())
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::Network { .. }));
}

#[tokio::test]
async fn send_end_to_end() {
    let posted = Posted::default();
    let base = serve(explorer(posted.clone())).await;
    let dir = tempfile::tempdir().unwrap();

    let config = WalletConfig {
        explorer_url: base,
        key_file: dir.path().join(".public_key"),
        ..WalletConfig::default()
    };
    let wallet = Wallet::new(
        EsploraClient::from_config(&config).unwrap(),
        FileKeyStore::new(&config.key_file),
        config,
    );

    let key = PrivateKey::from_slice(&[0x42; 32]).unwrap();
    let identity = wallet.initialize(&key).unwrap();
    assert_eq!(wallet.stored_identity().unwrap(), Some(identity.clone()));

    let txid = wallet
        .send(key, "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", 0.0005)
        .await
        .unwrap();

    let raw = posted.lock().unwrap().clone();
    assert_eq!(raw.len(), 1);
    let tx = SignedTransaction::from_hex(&raw[0]).unwrap();
    assert_eq!(tx.txid(), txid);
    assert_eq!(tx.inputs()[0].previous_output.txid.to_string(), FUNDING_TXID);

    // Fee rate 9.2 rounds up to 10 sat/vbyte: 258 vbytes -> 2580 sat.
    assert_eq!(tx.outputs()[0].value.to_sat(), 50_000);
    assert_eq!(tx.outputs()[1].value.to_sat(), 47_420);

    let own = derive_address(
        &derive_public_key(&PrivateKey::from_slice(&[0x42; 32]).unwrap()).unwrap(),
        BtcNetwork::Mainnet,
    )
    .unwrap();
    assert_eq!(identity.address, own);
    assert_eq!(tx.outputs()[1].script_pubkey, own.script_pubkey());
}
