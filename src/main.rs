//! # Comunica Hub Main Entry Point
//!
//! This is the main entry point for the Comunica Hub service.

use std::sync::Arc;

use comunica_hub::comunica::PjeComunicaClient;
use comunica_hub::config::ConfigLoader;
use comunica_hub::db::init_pool;
use comunica_hub::logging::init_subscriber;
use comunica_hub::migration::{Migrator, MigratorTrait};
use comunica_hub::server::run_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    init_subscriber(&config);

    // Log the loaded configuration (no secrets in current schema)
    println!("Loaded configuration for profile: {}", config.profile);
    if let Ok(redacted_json) = config.redacted_json() {
        println!("Configuration: {}", redacted_json);
    }

    let db = init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    let source = Arc::new(PjeComunicaClient::new(
        config.source_api_base.clone(),
        config.source_timeout_seconds,
    )?);

    run_server(config, db, source).await
}
