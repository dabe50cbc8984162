//! Millionaire backend entrypoint wiring configuration, storage, SSE and REST layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use millionaire_back::{
    config::AppConfig,
    dao::game_store::{GameStore, MemoryGameStore},
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);
    install_storage(&app_state).await;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Supervise MongoDB when `MONGO_URI` is set, otherwise keep everything in memory.
async fn install_storage(state: &SharedState) {
    #[cfg(feature = "mongo-store")]
    if let Ok(uri) = env::var("MONGO_URI") {
        use millionaire_back::{
            dao::{
                game_store::mongodb::{MongoConfig, MongoGameStore},
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        let db_name = env::var("MONGO_DB").ok();
        info!("using MongoDB storage");
        tokio::spawn(storage_supervisor::run(state.clone(), move || {
            let uri = uri.clone();
            let db_name = db_name.clone();
            async move {
                let config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
                let store = MongoGameStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
            }
        }));
        return;
    }

    info!("MONGO_URI not set; using in-memory storage");
    state
        .set_game_store(Arc::new(MemoryGameStore::new()) as Arc<dyn GameStore>)
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
