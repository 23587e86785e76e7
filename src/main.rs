#![allow(clippy::result_large_err)]

use clap::Parser;
use curation_buddy::{
    cli::{AppContext, Cli},
    config::{database, settings},
    core::{
        catalog,
        storage::{FileStore, SharedStore},
    },
    errors::Result,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Parse the command before touching the database so --help works anywhere
    let cli = Cli::parse();

    // 4. Load settings (CONFIG_PATH or ./config.toml)
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 5. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 6. First-run catalog seed
    if catalog::list_categories(&db, catalog::CatalogKind::Custom).await?.is_empty()
        && catalog::list_categories(&db, catalog::CatalogKind::Curated).await?.is_empty()
    {
        catalog::seed_catalog(&db, &settings.categories)
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    }

    // 7. Open the local store holding drafts and the active session
    let store: SharedStore = Arc::new(
        FileStore::open(&settings.local_storage_path)
            .inspect_err(|e| error!("Failed to open local storage: {}", e))?,
    );

    let ctx = AppContext {
        db,
        settings,
        store,
    };
    cli.run(&ctx).await.inspect_err(|e| error!("{}", e))
}
