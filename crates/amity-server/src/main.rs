use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use amity_api::{AppState, AppStateInner};
use amity_gateway::registry::Registry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("AMITY_LOG")
                .unwrap_or_else(|_| "amity=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("AMITY_DB_PATH").unwrap_or_else(|_| "amity.db".into());
    let host = std::env::var("AMITY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("AMITY_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database
    let db = amity_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db: Arc::new(db),
        registry: Registry::new(),
    });

    let app = amity_api::router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Amity server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
