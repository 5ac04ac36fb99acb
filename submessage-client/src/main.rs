//! submessage client demo
use clap::Parser;
use futures::StreamExt;
use log::{error, info, warn};
use submessage_client::pallets::sub_message::{self, ChannelRecord};
use submessage_client::pallets::sum_storage;
use submessage_client::query::QueryInvoker;
use submessage_client::rpc_registry::RpcRegistry;
use submessage_client::session::{ConnectionConfig, Session};
use submessage_client::signer::{self, AccountKey};
use submessage_client::tx_status::{DispatchOutcome, TransactionStatus};
use submessage_client::tx_submitter::{TxOptions, TxSubmitter};
use url::Url;

/// Substrate channel client CLI
#[derive(Parser, Debug)]
#[command(
    name = "submessage-client",
    about = "Reads SumStorage, creates a SubMessage channel and reads back a common key"
)]
struct Cli {
    /// WebSocket URL of the Substrate node
    #[arg(
        long,
        env = "NODE_URL",
        default_value = "ws://127.0.0.1:9944",
        help = "WebSocket URL of the Substrate node"
    )]
    endpoint: Url,

    /// Seed the development accounts are derived from (empty for the dev phrase)
    #[arg(
        long,
        env = "SEED",
        default_value = "",
        help = "Mnemonic or hex seed for deriving //Alice and //Bob"
    )]
    seed: String,

    /// Path to a hex encoded sr25519 secret used to sign instead of //Alice
    #[arg(long, env = "KEY_FILE", help = "Path to a key file for signing")]
    key_file: Option<String>,

    /// Path to a JSON file with custom RPC definitions
    #[arg(
        long,
        env = "RPC_DEFINITIONS",
        help = "Custom RPC definitions in polkadot-js layout"
    )]
    rpc_definitions: Option<String>,

    /// Channel to create
    #[arg(
        long,
        env = "CHANNEL_ID",
        default_value = "V1StGXR8_Z5jdHi6B-myT",
        help = "Identifier of the channel to create"
    )]
    channel_id: String,

    /// Number of blocks the extrinsic stays valid for
    #[arg(long, env = "MORTALITY", help = "Mortality period in blocks (immortal if unset)")]
    mortality: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger with fallback to info if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    info!("🚀 Starting submessage client...");

    let mut registry = match &cli.rpc_definitions {
        Some(path) => RpcRegistry::from_file(path).await?,
        None => RpcRegistry::new(),
    };
    if registry.get(sum_storage::RPC_SECTION, "getSum").is_none() {
        registry.register(sum_storage::get_sum_method());
    }

    let session = Session::connect(ConnectionConfig::new(cli.endpoint).registry(registry)).await?;
    let prefix = session.ss58_prefix();
    info!("Using {} with SS58 prefix {prefix}", session.endpoint());

    // ──────────────── QUERIES ────────────────
    let query = QueryInvoker::new(&session);
    let (thing1, thing2) = sum_storage::things(&query).await?;
    info!("The individual storage values are {thing1}, and {thing2}.");
    info!(
        "The sum calculated in the client is {}",
        sum_storage::client_sum(thing1, thing2)
    );

    let direct_sum = sum_storage::get_sum(&query).await?;
    info!("The sum queried directly from the RPC is {direct_sum}");

    // ──────────────── KEYS ────────────────
    let alice = AccountKey::derive(&cli.seed, "//Alice")?;
    let bob = AccountKey::derive(&cli.seed, "//Bob")?;
    info!("alice.address {}", alice.address().to_ss58(prefix)?);
    info!("alice.publicKey 0x{}", hex::encode(alice.public_key()));

    let signer = match &cli.key_file {
        Some(path) => signer::load_key_file(path).await?,
        None => alice.clone(),
    };

    // ──────────────── CHANNEL ────────────────
    let record = ChannelRecord::new(&cli.channel_id)
        .member(alice.address(), "alice common key")
        .member(bob.address(), "bob common key");
    if !record.includes(&signer.address()) {
        warn!("⚠️ The signer is not a member of the channel, the pallet will reject it.");
    }

    let mut options = TxOptions::default();
    if let Some(blocks) = cli.mortality {
        options = options.mortal(blocks);
    }

    let submitter = TxSubmitter::new(session.clone());
    let mut watch = submitter
        .submit_with(&record.new_channel_call(), &signer, options)
        .await?;
    info!("Watching extrinsic {:?}", watch.extrinsic_hash());

    while let Some(status) = watch.next().await {
        match status {
            Ok(TransactionStatus::Finalized {
                block_hash,
                outcome,
            }) if outcome.is_success() => info!("😉 Finalized. Block hash: {block_hash:?}"),
            Ok(TransactionStatus::Finalized {
                outcome: DispatchOutcome::Failed(details),
                ..
            }) => error!("{details}"),
            Ok(status) => info!("Current transaction status: {status}"),
            Err(err) => {
                error!("😞 Transaction Failed: {err}");
                break;
            }
        }
    }

    let common_key = sub_message::common_key(&query, &record.channel_id, &alice.address()).await?;
    info!("commonKey {common_key:?}");

    Ok(())
}
