//! FamVault: command-line entry point.

mod app;
mod cli;

use clap::Parser;
use famvault_core::error::VaultResult;
use famvault_db::{DbConfig, MemoryConnector, RemoteConnector, StoreConnector};
use tracing_subscriber::EnvFilter;

use crate::app::{App, Secrets};
use crate::cli::{Cli, Commands, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("famvault=info".parse()?))
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let secrets = Secrets::resolve(&cli.settings)?;

    let output = match cli.settings.store {
        Store::Remote => {
            let connector = RemoteConnector::new(DbConfig {
                url: cli.settings.db_url.clone(),
                namespace: cli.settings.db_namespace.clone(),
                username: cli.settings.db_user.clone(),
                password: cli.settings.db_pass.clone(),
            });
            execute(connector, secrets, cli.command).await?
        }
        Store::Memory => {
            tracing::warn!("Using the in-memory store; nothing is persisted");
            execute(MemoryConnector::new(cli.settings.db_namespace.clone()), secrets, cli.command)
                .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn execute<K: StoreConnector>(
    connector: K,
    secrets: Secrets,
    command: Commands,
) -> VaultResult<serde_json::Value> {
    let app = App::open(connector, secrets).await?;
    let result = app.run(command).await;
    app.shutdown().await;
    result
}
