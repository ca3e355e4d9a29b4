//! Voulence wallet CLI
//!
//! Drives the wallet session from the command line: connect, inspect and
//! disconnect a (simulated) Stellar wallet whose session survives restarts.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use voulence_wallet::audit::SessionAuditLog;
use voulence_wallet::config::EnvOverrides;
use voulence_wallet::format::{explorer_url, format_balance, truncate_address};
use voulence_wallet::{
    Config, ConnectOutcome, Error, FileSessionStore, Result, SimulatedProvider, WalletKind,
    WalletSession,
};

#[derive(Parser)]
#[command(name = "voulence")]
#[command(about = "Connect a Stellar wallet to Voulence")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a wallet
    Connect {
        /// Wallet to connect (freighter, lobstr, albedo, xbull)
        #[arg(short, long, default_value = "freighter")]
        wallet: String,

        /// Reconnect even if a session is already active
        #[arg(long)]
        force: bool,
    },

    /// Forget the current session
    Disconnect,

    /// Show the current session
    Status {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported wallets
    Wallets,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            cli.log_json
                .then(|| fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with((!cli.log_json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Connect { wallet, force } => {
            let wallet: WalletKind = wallet.parse()?;
            let session = open_session(&config, wallet).await;
            run_connect(&session, &config, force).await?;
        }
        Commands::Disconnect => {
            let session = open_session(&config, WalletKind::default()).await;
            session.disconnect().await;
            println!("Wallet disconnected");
        }
        Commands::Status { json } => {
            let session = open_session(&config, WalletKind::default()).await;
            print_status(&session, &config, json).await?;
        }
        Commands::Wallets => {
            for kind in WalletKind::ALL {
                let badge = if kind.is_recommended() {
                    " (recommended)"
                } else {
                    ""
                };
                println!(
                    "{:<10} {}{} - {}",
                    kind.id(),
                    kind.display_name(),
                    badge,
                    kind.description()
                );
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let mut config = if let Some(config_path) = path {
        let content =
            std::fs::read_to_string(config_path).map_err(|e| Error::Config(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
    } else {
        Config::default()
    };

    EnvOverrides::from_env().apply(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Composition root: wire provider, storage and audit log into a session
async fn open_session(config: &Config, wallet: WalletKind) -> WalletSession {
    let provider = Arc::new(SimulatedProvider::new(config.simulator.clone()).with_wallet(wallet));

    let session = match config.storage.state_dir {
        Some(ref dir) => {
            let store = Arc::new(FileSessionStore::new(dir, config.storage.namespace.clone()));
            tracing::debug!(path = %store.path().display(), "Using file session store");
            WalletSession::load_or_create(provider, store).await
        }
        None => WalletSession::new(provider),
    };

    match config.audit_log_path {
        Some(ref path) => session.with_audit_log(SessionAuditLog::new(path)),
        None => session,
    }
}

async fn run_connect(session: &WalletSession, config: &Config, force: bool) -> Result<()> {
    let current = session.snapshot().await;
    if current.is_connected && !force {
        println!("Already connected (use --force to reconnect)");
        return print_status(session, config, false).await;
    }

    println!("Connecting to wallet...");
    match session.connect().await {
        ConnectOutcome::Connected(_) => print_status(session, config, false).await,
        ConnectOutcome::Failed(message) => {
            println!("Connection Failed");
            println!("  {}", message);
            Err(Error::ConnectionFailure(message))
        }
        ConnectOutcome::Superseded => {
            println!("Connection attempt was cancelled");
            Ok(())
        }
    }
}

async fn print_status(session: &WalletSession, config: &Config, json: bool) -> Result<()> {
    let state = session.snapshot().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    match state.address {
        Some(ref address) if state.is_connected => {
            println!("Connected");
            println!("  Address:  {}", truncate_address(address, 8));
            println!("  Balance:  {}", format_balance(state.balance));
            println!("  Explorer: {}", explorer_url(config.network, address));
        }
        _ => println!("Not connected"),
    }

    if let Some(ref error) = state.error {
        println!("  Error: {}", error);
    }

    Ok(())
}
