//! Server entry point: env config, database bootstrap, router, serve.

use eventfinder::{
    api_router, apply_migrations, ensure_database_exists, AppState, MemorySessionStore, PgStorage,
    Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("eventfinder=info".parse()?))
        .init();

    let settings = Settings::from_env();
    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    apply_migrations(&pool).await?;

    let state = AppState::new(
        Arc::new(PgStorage::new(pool)),
        Arc::new(MemorySessionStore::new()),
    );

    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(1024 * 1024));

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
