//! Tessera command line.
//!
//! Thin dispatcher over the engine: every subcommand connects, establishes
//! the payer, checks the program is deployed, then runs one lifecycle
//! operation. Addresses and amounts always come from flags, never from code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use solana_client::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use tokio::signal;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tessera_sdk::{CancelFlag, VaultClient};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Mint, vault, and fractionalize NFTs")]
#[command(version)]
struct Cli {
    /// RPC endpoint URL
    #[arg(long, env = "TESSERA_RPC_URL", default_value = "http://localhost:8899")]
    rpc_url: String,

    /// Path to the fee payer keypair file
    #[arg(long, env = "TESSERA_KEYPAIR", default_value = "~/.config/solana/id.json")]
    keypair: String,

    /// Fractionalization program id
    #[arg(long, env = "TESSERA_PROGRAM_ID")]
    program_id: Pubkey,

    /// Commitment level for RPC queries
    #[arg(long, value_enum, default_value_t = Commitment::Confirmed)]
    commitment: Commitment,

    /// Maximum mint re-derivation attempts before giving up
    #[arg(long, default_value_t = 8)]
    max_mint_attempts: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl From<Commitment> for CommitmentConfig {
    fn from(commitment: Commitment) -> Self {
        match commitment {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Mint an NFT with metadata to a destination wallet
    Mint {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        uri: String,
        #[arg(long)]
        destination: Pubkey,
    },
    /// Create an empty vault in Inactive state
    InitVault,
    /// Deposit an NFT into a vault's safety deposit box
    VaultNft {
        #[arg(long)]
        vault: Pubkey,
        /// Mint of the deposited NFT
        #[arg(long)]
        token: Pubkey,
    },
    /// Activate the vault if needed and mint fractional shares
    Fractionalize {
        #[arg(long)]
        vault: Pubkey,
        #[arg(long)]
        shares: u64,
    },
    /// Send fractional shares to a destination wallet
    Send {
        #[arg(long)]
        vault: Pubkey,
        /// Mint of the deposited NFT backing the shares
        #[arg(long)]
        token: Pubkey,
        #[arg(long)]
        destination: Pubkey,
        #[arg(long)]
        amount: u64,
    },
    /// Show a vault's on-ledger state
    VaultInfo {
        #[arg(long)]
        vault: Pubkey,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let payer = load_keypair(&cli.keypair)?;
    let rpc = RpcClient::new_with_commitment(cli.rpc_url.clone(), cli.commitment.into());

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, aborting before the next submission");
                cancel.set();
            }
        });
    }

    let client = VaultClient::connect(rpc, payer, cli.program_id, cli.max_mint_attempts, cancel)?;

    match cli.command {
        Command::Mint {
            name,
            symbol,
            uri,
            destination,
        } => {
            let receipt = client.mint_nft(&name, &symbol, &uri, &destination)?;
            println!("mint: {}", receipt.mint);
            println!("metadata: {}", receipt.metadata);
            println!("token account: {}", receipt.token_account);
            println!("signature: {}", receipt.signature);
            if receipt.attempts > 1 {
                println!("(succeeded on attempt {})", receipt.attempts);
            }
        }
        Command::InitVault => {
            let receipt = client.create_vault()?;
            println!("vault: {}", receipt.vault);
            println!("vault authority: {}", receipt.vault_authority);
            println!("external pricing: {}", receipt.external_pricing);
            println!("fraction mint: {}", receipt.fraction_mint);
            println!("redeem treasury: {}", receipt.redeem_treasury);
            println!("fraction treasury: {}", receipt.fraction_treasury);
            println!("signature: {}", receipt.signature);
        }
        Command::VaultNft { vault, token } => {
            let receipt = client.add_token(&vault, &token)?;
            println!("safety deposit box: {}", receipt.safety_deposit_box);
            println!("token store: {}", receipt.token_store);
            println!("signature: {}", receipt.signature);
        }
        Command::Fractionalize { vault, shares } => {
            let signature = client.fractionalize(&vault, shares)?;
            println!("signature: {signature}");
        }
        Command::Send {
            vault,
            token,
            destination,
            amount,
        } => {
            let signature = client.send_share(&vault, &token, &destination, amount)?;
            println!("signature: {signature}");
        }
        Command::VaultInfo { vault } => {
            let (state, account) = client.vault_info(&vault)?;
            println!("state: {state:?}");
            if let Some(account) = account {
                println!("authority: {}", account.authority);
                println!("fraction mint: {}", account.fraction_mint);
                println!("fraction treasury: {}", account.fraction_treasury);
                println!("redeem treasury: {}", account.redeem_treasury);
                println!("pricing lookup: {}", account.pricing_lookup_address);
                println!("deposited token types: {}", account.token_type_count);
                println!("locked price per share: {}", account.locked_price_per_share);
            }
        }
    }

    Ok(())
}

fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded = shellexpand::tilde(path);
    let contents = std::fs::read_to_string(expanded.as_ref())
        .with_context(|| format!("failed to read keypair file {expanded}"))?;
    let bytes: Vec<u8> = serde_json::from_str(&contents)
        .with_context(|| format!("keypair file {expanded} is not a JSON byte array"))?;
    Keypair::try_from(bytes.as_slice()).context("keypair file holds invalid key material")
}
