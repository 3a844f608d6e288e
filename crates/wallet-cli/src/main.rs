//! btc-wallet: command-line interface for a single-key P2PKH Bitcoin wallet.
//!
//! Only the public key is kept on disk. The private key is prompted for
//! (hidden input) whenever funds are spent.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chain_btc::{BtcNetwork, PrivateKey};
use clap::{Args, Parser, Subcommand};
use wallet_core::amount::sat_to_btc;
use wallet_core::{EsploraClient, FileKeyStore, Wallet, WalletConfig, WalletIdentity};
use zeroize::Zeroizing;

type CliWallet = Wallet<EsploraClient, FileKeyStore>;

/// Legacy P2PKH Bitcoin wallet backed by an Esplora block explorer.
#[derive(Parser, Debug)]
#[command(name = "btc-wallet")]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Defaults to `init` when no wallet exists, `balance` otherwise.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Network: mainnet, testnet or signet [env: BTC_WALLET_NETWORK].
    #[arg(long, global = true)]
    network: Option<BtcNetwork>,

    /// Esplora REST base URL [env: BTC_WALLET_EXPLORER_URL].
    #[arg(long, global = true)]
    explorer_url: Option<String>,

    /// File holding the wallet's public key [env: BTC_WALLET_KEY_FILE].
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,
}

impl GlobalArgs {
    /// Layer command-line flags over an environment-derived configuration.
    fn apply(self, mut config: WalletConfig) -> WalletConfig {
        if let Some(network) = self.network {
            // Keep a custom explorer, but follow the network's public one.
            if config.explorer_url == config.network.default_explorer_url() {
                config.explorer_url = network.default_explorer_url().to_string();
            }
            config.network = network;
        }
        if let Some(url) = self.explorer_url {
            config.explorer_url = url;
        }
        if let Some(path) = self.key_file {
            config.key_file = path;
        }
        config
    }
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Create or import a key and store its public key.
    Init,
    /// Show the stored wallet's address and confirmed balance.
    Balance,
    /// Send bitcoin to an address, returning change to the wallet.
    Send(SendArgs),
}

#[derive(Args, Debug, PartialEq)]
struct SendArgs {
    /// Recipient P2PKH address.
    #[arg(short, long)]
    to: String,

    /// Amount to send in BTC (e.g. 0.0005).
    #[arg(short, long, allow_negative_numbers = true)]
    amount: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = cli
        .global
        .apply(WalletConfig::from_env().context("Invalid BTC_WALLET_* environment")?);
    config.validate()?;
    tracing::debug!(?config, "loaded configuration");

    let client = EsploraClient::from_config(&config)?;
    let store = FileKeyStore::new(config.key_file.clone());
    let wallet = Wallet::new(client, store, config);

    let command = match cli.command {
        Some(command) => command,
        None => match wallet.stored_identity()? {
            Some(_) => Commands::Balance,
            None => Commands::Init,
        },
    };

    match command {
        Commands::Init => init(&wallet).map(|_| ()),
        Commands::Balance => balance(&wallet).await,
        Commands::Send(args) => send(&wallet, args).await,
    }
}

/// Import a private key (or generate one) and persist its public key.
fn init(wallet: &CliWallet) -> Result<WalletIdentity> {
    let input = prompt_secret("Private key (hex, press Enter to generate)")?;
    let private_key = if input.trim().is_empty() {
        PrivateKey::generate()
    } else {
        parse_private_key(&input)?
    };

    let identity = wallet
        .initialize(&private_key)
        .context("Failed to initialize wallet")?;

    println!("\n=== WALLET INITIALIZED ===");
    println!("Network: {}", wallet.config().network);
    println!("Private key: {}", private_key.to_hex().as_str());
    println!("Public key: {}", identity.public_key_hex());
    println!("Address: {}", identity.address);
    println!("\nWARNING: The private key is NOT stored and will not be shown again.");
    println!("Anyone holding it can spend the funds at this address.");
    println!("\nPublic key saved to: {}", wallet.config().key_file.display());
    Ok(identity)
}

/// Query and display the stored wallet's balance.
async fn balance(wallet: &CliWallet) -> Result<()> {
    let identity = ensure_identity(wallet)?;
    let sats = wallet
        .get_balance(&identity.address)
        .await
        .with_context(|| format!("Failed to fetch balance for {}", identity.address))?;

    println!("Address: {}", identity.address);
    println!("Balance: {:.8} BTC ({sats} sat)", sat_to_btc(sats));
    Ok(())
}

async fn send(wallet: &CliWallet, args: SendArgs) -> Result<()> {
    let identity = ensure_identity(wallet)?;

    let input = prompt_secret(&format!("Private key for {}", identity.address))?;
    let private_key = parse_private_key(&input)?;
    if wallet.identity_for(&private_key)?.address != identity.address {
        bail!(
            "Private key does not belong to the wallet address {}",
            identity.address
        );
    }

    let txid = wallet
        .send(private_key, &args.to, args.amount)
        .await
        .context("Send failed")?;

    println!("\n=== TRANSACTION SENT ===");
    println!("TxID: {txid}");
    println!("From: {}", identity.address);
    println!("To: {}", args.to);
    println!("Amount: {:.8} BTC", args.amount);
    Ok(())
}

/// The stored wallet identity, running `init` first when there is none.
fn ensure_identity(wallet: &CliWallet) -> Result<WalletIdentity> {
    match wallet
        .stored_identity()
        .context("Failed to load stored public key")?
    {
        Some(identity) => Ok(identity),
        None => {
            println!("No wallet found, initializing a new one.");
            init(wallet)
        }
    }
}

fn parse_private_key(input: &str) -> Result<PrivateKey> {
    PrivateKey::from_hex(input.trim()).context("Invalid private key (expected 64 hex characters)")
}

/// Prompt for a secret without echo.
fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    rpassword::prompt_password(format!("{prompt}: "))
        .map(Zeroizing::new)
        .context("Failed to read input")
}
