//! # folio-admin entry point
//!
//! Parses command-line arguments, loads client configuration and dispatches
//! to the console commands.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use folio_admin::commands::{run, Command, Console};
use folio_common::config::ClientConfig;

/// Folio admin console
#[derive(Parser, Debug)]
#[command(name = "folio-admin", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Gateway base URL (overrides gateway.url).
    #[arg(long, global = true, env = "FOLIO_GATEWAY_URL")]
    gateway: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("folio-admin v{} starting", folio_common::VERSION);

    let mut config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("failed to load configuration: {e}");
            return ExitCode::from(2);
        }
    };
    if let Some(url) = cli.gateway {
        config.gateway.url = url;
    }

    let console = match Console::new(config) {
        Ok(console) => console,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };
    tracing::debug!(gateway = console.gateway.base_url(), "console ready");

    match run(cli.command, &console).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
