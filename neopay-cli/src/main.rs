//! Neo Pay CLI - wallet-aware chat shell for the payment assistant.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use neopay::config::{self, NeoPayConfig};
use neopay::wallet::networks;
use neopay_cli::chat::ChatSession;
use neopay_cli::{build_api, build_wallet};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Neo Pay - chat assistant with wallet actions and x402 micropayments
#[derive(Parser)]
#[command(name = "neopay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Backend API base URL
    #[arg(long, env = "NEOPAY_API_URL", global = true)]
    api_url: Option<String>,

    /// Wallet JSON-RPC endpoint URL
    #[arg(long, env = "NEOPAY_RPC_URL", global = true)]
    rpc_url: Option<String>,

    /// Wallet private key (hex)
    #[arg(long, env = "NEOPAY_PRIVATE_KEY", global = true, hide_env_values = true)]
    private_key: Option<String>,

    /// Chain id override, decimal or 0x-prefixed hex
    #[arg(long, env = "NEOPAY_CHAIN_ID", global = true)]
    chain_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat(ChatArgs),

    /// Show a native-token balance
    Balance(BalanceArgs),

    /// Show backend usage quota
    Status,

    /// List supported networks
    Networks,
}

/// Arguments for the chat command
#[derive(Args)]
struct ChatArgs {
    /// Initial message to send
    #[arg(short, long)]
    message: Option<String>,
}

/// Arguments for the balance command
#[derive(Args)]
struct BalanceArgs {
    /// Address to query; defaults to the wallet account
    address: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "neopay={level},neopay_cli={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> anyhow::Result<()> {
    // Flags (with their env fallbacks) feed the config lookup directly.
    let config = NeoPayConfig::from_lookup(|name| match name {
        config::ENV_API_URL => cli.api_url.clone(),
        config::ENV_RPC_URL => cli.rpc_url.clone(),
        config::ENV_PRIVATE_KEY => cli.private_key.clone(),
        config::ENV_CHAIN_ID => cli.chain_id.clone(),
        _ => None,
    })?;

    match cli.command {
        Commands::Chat(args) => cmd_chat(args, config).await,
        Commands::Balance(args) => cmd_balance(args, config).await,
        Commands::Status => cmd_status(config).await,
        Commands::Networks => cmd_networks(),
    }
}

/// Start the interactive chat session.
async fn cmd_chat(args: ChatArgs, config: NeoPayConfig) -> anyhow::Result<()> {
    let wallet = build_wallet(&config).await?;
    if wallet.is_available() {
        if let Err(e) = wallet.connect().await {
            tracing::warn!("wallet connection failed: {e}");
        }
    } else {
        println!("No wallet configured; chat only. Set NEOPAY_RPC_URL and NEOPAY_PRIVATE_KEY.");
    }

    let api = build_api(&config, std::sync::Arc::clone(&wallet));
    let mut session = ChatSession::new(api, wallet);
    session.run(args.message).await
}

/// Print a native-token balance.
async fn cmd_balance(args: BalanceArgs, config: NeoPayConfig) -> anyhow::Result<()> {
    let wallet = build_wallet(&config).await?;
    wallet.connect().await?;

    let address = match args.address {
        Some(raw) => Some(
            raw.parse()
                .map_err(|e| anyhow::anyhow!("invalid address '{raw}': {e}"))?,
        ),
        None => None,
    };
    let balance = wallet.get_balance(address).await?;
    println!("{balance} ETH");
    Ok(())
}

/// Print the backend usage quota.
async fn cmd_status(config: NeoPayConfig) -> anyhow::Result<()> {
    let wallet = build_wallet(&config).await?;
    let api = build_api(&config, wallet);

    let status = api.user_status().await?;
    println!(
        "Requests used: {}/{} ({} remaining)",
        status.requests_made,
        status.free_limit,
        status.remaining()
    );
    if status.payment_required {
        match &status.payment_amount {
            Some(amount) => println!("Payment required: {amount} ETH"),
            None => println!("Payment required."),
        }
    }
    Ok(())
}

/// List the networks in the static registry.
fn cmd_networks() -> anyhow::Result<()> {
    for network in networks::all() {
        let explorer = network
            .block_explorer_urls
            .first()
            .map_or("-", String::as_str);
        println!(
            "{:<10} {:<20} {}",
            network.chain_id, network.chain_name, explorer
        );
    }
    Ok(())
}
