use clap::Parser;

use stockroom_infra::{InventoryConfig, InventoryEngine, InventoryStore};

mod cli;
mod commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    stockroom_observability::init_with(cli.log_format);

    let mut config = InventoryConfig::from_env()?;
    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }
    if let Some(policy) = cli.deletion_policy {
        config = config.with_deletion_policy(policy);
    }

    let store = InventoryStore::open(&config).await?;
    let engine = InventoryEngine::from_config(&config);
    let result = commands::run_command(&store, &engine, cli).await;
    store.close().await;
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "command failed");
    }
    result
}
