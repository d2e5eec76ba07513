use maintenance_buddy::{
    bot::{self, BotData},
    config::{
        database::{create_connection, create_tables},
        settings::load_app_configuration,
        users::RoleDirectory,
    },
    core::{
        context::MaintenanceContext, document_store::SeaOrmDocumentStore,
        maintenance_store::MaintenanceStore, service::MaintenanceService,
    },
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Application configuration (defaults when config.toml is absent)
    let app_config = load_app_configuration()
        .inspect_err(|e| error!("Failed to load application configuration: {}", e))?;

    // 4. Database and document store
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db).await?;
    info!("Database initialized successfully.");

    let store = MaintenanceStore::new(Arc::new(SeaOrmDocumentStore::new(db)));
    let service = MaintenanceService::new(store.clone());
    let context = MaintenanceContext::new(store);

    // 5. Initial load; the gate stays open until this succeeds
    match context.init().await {
        Ok(active) => info!(active, "Loaded maintenance flag"),
        Err(e) => warn!("Could not load maintenance flag, starting unknown: {}", e),
    }
    if let Err(e) = service.refresh().await {
        warn!("Could not read global maintenance document: {}", e);
    }
    let _watcher = service.spawn_global_watcher(app_config.maintenance.poll_interval());

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(
        context,
        service,
        app_config.maintenance.gate(),
        RoleDirectory::from_env(),
        app_config.site.site_name,
    );
    bot::run_bot(token, data).await?;

    Ok(())
}
