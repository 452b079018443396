use anyhow::Result;
use clap::Parser;
use ledger_service::server;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledger-service")]
#[command(about = "Authenticated account ledger service")]
enum Cli {
    /// Run TCP server
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        bind: String,
        #[arg(long, default_value = "1000")]
        max_connections: usize,
        /// Directory holding users.json and accounts.json
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Secret used to sign session tokens
        #[arg(long, default_value = "change-me")]
        secret: String,
        /// Session token lifetime in seconds
        #[arg(long, default_value = "3600")]
        token_ttl_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match Cli::parse() {
        Cli::Serve {
            bind,
            max_connections,
            data_dir,
            secret,
            token_ttl_secs,
        } => {
            server::run(
                bind,
                max_connections,
                data_dir,
                secret,
                Duration::from_secs(token_ttl_secs),
            )
            .await?;
        }
    }

    Ok(())
}
