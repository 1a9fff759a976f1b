use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use common::{
    cache::{RedisClient, RedisConfig},
    database::{DatabaseConfig, health_check, init_pool},
};
use market::{
    AppState,
    config::{ServerConfig, SessionBackend},
    create_router,
    database::run_migrations,
    repositories::{PgListingRepository, PgUserRepository},
    session::{InMemorySessionStore, RedisSessionStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting marketplace service");

    let config = ServerConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Redis => {
            let redis_config = RedisConfig::from_env()?;
            let redis = RedisClient::connect(&redis_config).await?;
            if !redis.ping().await? {
                anyhow::bail!("Redis did not answer PING");
            }
            Arc::new(RedisSessionStore::new(redis))
        }
        SessionBackend::Memory => {
            warn!("Using in-process session storage; sessions are lost on restart");
            Arc::new(InMemorySessionStore::new())
        }
    };

    let bind_address = config.bind_address.clone();
    let app_state = AppState::new(
        config,
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgListingRepository::new(pool.clone())),
        sessions,
    )?;

    info!("Marketplace service initialized successfully");

    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Marketplace service listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, closing database pool");
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
