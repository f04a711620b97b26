use std::net::SocketAddr;
use std::sync::Arc;

use devsync_api::config::ServerConfig;
use devsync_api::router::build_app_router;
use devsync_api::state::AppState;
use devsync_db::{PgStore, StoreHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Used when `RUST_LOG` is unset. `devsync_db` already logs every rendered
/// statement, so sqlx's own per-query events are kept to warnings.
const DEFAULT_LOG_FILTER: &str = "devsync_api=debug,devsync_db=debug,tower_http=debug,sqlx=warn";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        posts_per_page = config.posts_per_page,
        cors_origins = ?config.cors_origins,
        "DevSync configuration loaded",
    );

    let store = connect_store(&config).await;
    let app = build_app_router(AppState::new(store, config.clone()), &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Cannot bind {addr}: {e}"));
    tracing::info!(%addr, "DevSync API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("DevSync API stopped");
}

/// Open the Postgres pool, check it answers, bring the schema up to date
/// and wrap it as the store every module runs against.
async fn connect_store(config: &ServerConfig) -> StoreHandle {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = devsync_db::create_pool(&database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    devsync_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    devsync_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!(
        max_connections = config.db_max_connections,
        "Postgres store ready, schema migrated",
    );

    Arc::new(PgStore::new(pool))
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Draining in-flight requests");
}
