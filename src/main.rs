//! Kiva Mining Monitor CLI
//!
//! Polls every account in the token file and redraws a status table.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kiva_bot::{load_proxies, load_tokens, Collector, Config, Scheduler, Transport};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "kiva-bot")]
#[command(about = "Balance and mining-time monitor for Kivanet accounts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Token file (overrides TOKEN_FILE)
    #[arg(short, long, global = true)]
    token_file: Option<String>,

    /// Proxy file; enables proxy failover (overrides PROXY_FILE)
    #[arg(short, long, global = true)]
    proxy_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll all accounts continuously (default)
    Run {
        /// Poll interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single cycle and exit
    Once,

    /// Validate the proxy file and list the parsed proxies
    Proxies,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(path) = cli.token_file {
        config.token_file = path;
    }
    if let Some(path) = cli.proxy_file {
        config.proxy_file = Some(path);
    }
    if let Some(Commands::Run { interval: Some(secs) }) = cli.command {
        config.poll_interval_seconds = secs;
    }
    config.validate()?;

    match cli.command.unwrap_or(Commands::Run { interval: None }) {
        Commands::Proxies => list_proxies(&config),
        Commands::Once => {
            let mut scheduler = build_scheduler(&config)?;
            scheduler.run_once().await;
            Ok(())
        }
        Commands::Run { .. } => {
            let scheduler = build_scheduler(&config)?;
            scheduler.run().await;
            Ok(())
        }
    }
}

fn build_scheduler(config: &Config) -> Result<Scheduler> {
    let tokens = load_tokens(&config.token_file)?;
    info!("Loaded {} tokens from {}", tokens.len(), config.token_file);

    let transport = match &config.proxy_file {
        Some(path) => {
            let proxies = load_proxies(path)?;
            info!("Loaded {} proxies from {}", proxies.len(), path);
            if proxies.is_empty() {
                warn!("Proxy file {} is empty; every request will fail until proxies are added", path);
            }
            Transport::proxied(proxies, config.request_timeout())
                .context("Failed to build proxied HTTP clients")?
        }
        None => {
            info!("No proxy file configured, requests go out directly");
            Transport::direct(config.request_timeout()).context("Failed to build HTTP client")?
        }
    };

    let collector = Collector::new(config, transport);
    Ok(Scheduler::new(
        collector,
        tokens,
        config.poll_interval(),
        config.account_timeout(),
    ))
}

fn list_proxies(config: &Config) -> Result<()> {
    let path = config
        .proxy_file
        .as_deref()
        .context("No proxy file configured (set PROXY_FILE or pass --proxy-file)")?;
    let proxies = load_proxies(path)?;

    println!("\n{}", "=".repeat(50));
    println!("  PROXIES ({}) from {}", proxies.len(), path);
    println!("{}\n", "=".repeat(50));

    for (i, proxy) in proxies.iter().enumerate() {
        println!("{:>3}. {}", i + 1, proxy);
    }

    if proxies.is_empty() {
        println!("No proxies found; every proxied request would fail immediately.");
    }
    println!();

    Ok(())
}
