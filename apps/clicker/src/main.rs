mod config;
mod view;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ClickerClient, ClickerEvent, ConnectionError, InjectedProvider, JsonRpcWallet, WalletProvider,
    WalletSurface,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::view::Alert;

#[derive(Parser, Debug)]
#[command(name = "clicker", about = "Gas Battle clicker for RISE Testnet")]
struct Cli {
    #[arg(long, default_value = "clicker.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and print the owner and click count.
    Status,
    /// Connect and send click transactions one after another.
    Click {
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Read `connect`, `gas`, `status` and `quit` commands from stdin.
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let settings = config::load_settings(&cli.config)?;
    let setup = settings
        .into_setup()
        .context("invalid clicker configuration")?;
    info!(
        network = %setup.config.network.display_name,
        chain_id = %setup.config.network.chain_id,
        contract = %setup.config.contract.address,
        "configuration loaded"
    );

    let surface = Arc::new(WalletSurface::default());
    for wallet in setup.wallets {
        let rpc = JsonRpcWallet::new(wallet.url);
        info!(wallet = %wallet.descriptor.name, url = %rpc.url(), "wallet endpoint injected");
        let provider: Arc<dyn WalletProvider> = Arc::new(rpc);
        surface
            .inject(InjectedProvider::new(wallet.descriptor, provider))
            .await;
    }
    let client = Arc::new(ClickerClient::new(setup.config, surface));
    run(client, cli.command).await
}

/// Runs one subcommand; a failed connect or click is returned as an error so
/// the process exits non-zero.
async fn run(client: Arc<ClickerClient>, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            connect(&client).await.context("wallet connection failed")?;
            print!("{}", view::render(&client.snapshot().await));
        }
        Command::Click { times } => {
            connect(&client).await.context("wallet connection failed")?;
            for attempt in 1..=times {
                client
                    .gas()
                    .await
                    .with_context(|| format!("click {attempt} of {times} failed"))?;
                print!("{}", view::render(&client.snapshot().await));
            }
        }
        Command::Interactive => interactive(client).await?,
    }
    Ok(())
}

/// Connects the wallet; contract reads that failed are shown as alerts.
async fn connect(client: &ClickerClient) -> Result<(), ConnectionError> {
    let context = client.connect_wallet().await?;
    for failure in &context.failures {
        eprintln!("{}", Alert(failure));
    }
    Ok(())
}

async fn interactive(client: Arc<ClickerClient>) -> Result<()> {
    let progress = tokio::spawn(report_progress(client.subscribe_events()));
    print!("{}", view::render(&client.snapshot().await));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match line.trim() {
            "" => continue,
            "connect" => {
                if let Err(err) = connect(&client).await {
                    eprintln!("{}", Alert(&err));
                }
                print!("{}", view::render(&client.snapshot().await));
            }
            "gas" => {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    if let Err(err) = client.gas().await {
                        eprintln!("{}", Alert(&err));
                    }
                    print!("{}", view::render(&client.snapshot().await));
                });
            }
            "status" => print!("{}", view::render(&client.snapshot().await)),
            "quit" | "exit" => break,
            other => eprintln!("unknown command '{other}' (connect, gas, status, quit)"),
        }
    }

    progress.abort();
    Ok(())
}

async fn report_progress(mut events: broadcast::Receiver<ClickerEvent>) {
    loop {
        match events.recv().await {
            Ok(ClickerEvent::SubmissionStarted) => println!("{}", view::PROCESSING_BUTTON),
            Ok(ClickerEvent::TransactionSent { tx_hash }) => println!("sent {tx_hash}"),
            Ok(ClickerEvent::TransactionConfirmed {
                tx_hash,
                block_number,
                ..
            }) => match block_number {
                Some(block) => println!("confirmed {tx_hash} in block {block}"),
                None => println!("confirmed {tx_hash}"),
            },
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "progress reporter lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
