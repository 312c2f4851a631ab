//! Local Library server
//!
//! Serves the catalog JSON API over HTTP.

use std::{net::SocketAddr, sync::Arc};

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locallibrary::{
    api,
    config::{AppConfig, SessionBackend},
    repository::Repository,
    services::{
        sessions::{MemorySessionStore, RedisSessionStore, SessionStore},
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("locallibrary={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Local Library server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Redis => {
            let store = RedisSessionStore::new(&config.redis.url, config.session.max_age_seconds).await?;
            tracing::info!("Connected to Redis");
            Arc::new(store)
        }
        SessionBackend::Memory => {
            tracing::warn!("Using in-memory sessions; visit counters are lost on restart");
            Arc::new(MemorySessionStore::new(config.session.max_age_seconds))
        }
    };

    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone(), sessions);

    if let Some(user) = services.users.bootstrap_superuser().await? {
        tracing::info!("Created superuser {}", user.login);
    }

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
