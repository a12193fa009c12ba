//! spotiquiz-back binary entrypoint wiring REST, WebSocket and room store layers.

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spotiquiz_back::{
    config::AppConfig,
    dao::room_store::{MemoryRoomStore, RoomStore},
    routes,
    state::{AppState, SharedState},
};

/// How often the in-memory store drops expired records.
const MEMORY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let (store, backend) = connect_store().await;
    let app_state = AppState::new(config, store, backend);

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8081);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, store = backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the room store: Redis when `REDIS_URL` is set, the in-memory store otherwise.
async fn connect_store() -> (Arc<dyn RoomStore>, &'static str) {
    #[cfg(feature = "redis-store")]
    {
        if let Some(config) = spotiquiz_back::dao::room_store::RedisConfig::from_env() {
            let store = connect_redis(&config).await;
            return (Arc::new(store), "redis");
        }
    }

    info!("no Redis configured; using the in-memory room store");
    let store = MemoryRoomStore::new();
    store.spawn_sweeper(MEMORY_SWEEP_INTERVAL);
    (Arc::new(store), "memory")
}

/// Retry the Redis connection with exponential backoff until it succeeds.
#[cfg(feature = "redis-store")]
async fn connect_redis(
    config: &spotiquiz_back::dao::room_store::RedisConfig,
) -> spotiquiz_back::dao::room_store::RedisRoomStore {
    use spotiquiz_back::dao::room_store::RedisRoomStore;
    use tokio::time::sleep;
    use tracing::warn;

    let initial_delay = Duration::from_secs(1);
    let max_delay = Duration::from_secs(10);
    let mut delay = initial_delay;

    loop {
        match RedisRoomStore::connect(config).await {
            Ok(store) => {
                info!("connected to Redis");
                return store;
            }
            Err(err) => {
                warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "Redis connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(max_delay);
            }
        }
    }
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

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
