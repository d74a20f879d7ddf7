use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tour_service::{
    build_router,
    config::{StoreBackend, TourConfig},
    services::{MemoryStore, MongoStore, TourStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = TourConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    tour_service::services::metrics::init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        store = ?config.store,
        "Starting tour marketplace service"
    );

    let store: Arc<dyn TourStore> = match (config.store, config.mongodb.as_ref()) {
        (StoreBackend::Mongo, Some(mongo)) => {
            let db = MongoStore::connect(&mongo.uri, &mongo.database)
                .await
                .map_err(|e| AppError::DatabaseError(e.into()))?;
            db.initialize_indexes()
                .await
                .map_err(|e| AppError::DatabaseError(e.into()))?;
            tracing::info!("Database initialized successfully");
            Arc::new(db)
        }
        (StoreBackend::Mongo, None) => {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MongoDB settings missing for the mongo store backend"
            )));
        }
        (StoreBackend::Memory, _) => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = config.common.bind_addr();
    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        environment = ?config.environment,
    );

    let state = AppState::new(config, store);
    let app = build_router(state);

    let _guard = service_span.enter();
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(anyhow::Error::from)?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(anyhow::Error::from)?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
