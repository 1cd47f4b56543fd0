//! inmo-api - Real estate listing service
//!
//! Single-binary HTTP service: admin record editing with media uploads,
//! public browse with query relaxation, and static serving of transcoded
//! media under /uploads.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use inmo_api::config::Config;
use inmo_api::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting inmo-api");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::resolve()?;
    inmo_api::config::ensure_directories(&config)?;
    info!("Database: {}", config.database_path.display());
    info!("Uploads: {}", config.uploads_dir.display());

    let db_pool = inmo_api::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let state = AppState::new(db_pool, &config.uploads_dir);
    let app = inmo_api::build_router(state, &config.uploads_dir);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
