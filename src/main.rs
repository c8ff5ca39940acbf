//! Newsletter Cache - HTTP service entry point
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from the environment and `.env`
//! 3. Connect the configured store (degrading to no cache on failure)
//! 4. Start the expiry sweep for the in-memory backend
//! 5. Wire generator, telemetry, gateway and router
//! 6. Serve until SIGINT/SIGTERM, then close the store and flush telemetry

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsletter_cache::api::{create_router, AppState};
use newsletter_cache::cache::{CacheStore, DisabledStore, MemoryStore, RedisStore};
use newsletter_cache::config::{Config, StoreBackend};
use newsletter_cache::generator::{Generator, HttpGenerator, UnconfiguredGenerator};
use newsletter_cache::spawn_cleanup_task;
use newsletter_cache::telemetry::{NdjsonTelemetry, NullTelemetry, Telemetry};

/// Upper bound on draining queued telemetry at shutdown
const TELEMETRY_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Store handles owned by `main` for the lifetime of the process.
struct StoreHandles {
    store: Arc<dyn CacheStore>,
    redis: Option<Arc<RedisStore>>,
    cleanup: Option<JoinHandle<()>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsletter_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Newsletter Cache service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: backend={:?}, port={}, store_timeout={}ms, generator_timeout={}s",
        config.backend,
        config.server_port,
        config.store_timeout.as_millis(),
        config.generator_timeout.as_secs()
    );

    let handles = connect_store(&config).await;
    info!(
        "Cache store ready: backend={}, available={}",
        handles.store.backend(),
        handles.store.is_available()
    );

    let generator: Arc<dyn Generator> = match &config.generator_url {
        Some(url) => {
            info!("Generating newsletters via {}", url);
            Arc::new(HttpGenerator::new(url.clone()))
        }
        None => {
            warn!("GENERATOR_URL not set; cache misses will report errors");
            Arc::new(UnconfiguredGenerator)
        }
    };

    let mut telemetry_writer = None;
    let telemetry: Arc<dyn Telemetry> = if config.telemetry_enabled {
        let (sink, writer) = NdjsonTelemetry::spawn(config.telemetry_dir.clone());
        info!("Writing cache telemetry to {}", sink.dir().display());
        telemetry_writer = Some(writer);
        Arc::new(sink)
    } else {
        Arc::new(NullTelemetry)
    };

    let state = AppState::from_config(&config, handles.store.clone(), generator, telemetry);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(cleanup) = handles.cleanup {
        cleanup.abort();
        warn!("Expiry sweep aborted");
    }
    if let Some(redis) = handles.redis {
        if let Err(e) = redis.close().await {
            warn!("Error closing Redis connections: {}", e);
        }
    }
    // The router owned the last sink handle, so the writer is draining
    if let Some(writer) = telemetry_writer {
        match tokio::time::timeout(TELEMETRY_FLUSH_TIMEOUT, writer).await {
            Ok(Ok(())) => info!("Telemetry flushed"),
            Ok(Err(e)) => warn!("Telemetry writer failed: {}", e),
            Err(_) => warn!("Telemetry flush timed out"),
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the configured store. A Redis connection failure is not fatal:
/// the service runs uncached, as it would without `REDIS_URL`.
async fn connect_store(config: &Config) -> StoreHandles {
    match config.backend {
        StoreBackend::Redis => {
            let url = config.redis_url.as_deref().unwrap_or_default();
            match RedisStore::connect(url, config.redis_pool_size, config.store_timeout).await {
                Ok(redis) => {
                    let redis = Arc::new(redis);
                    StoreHandles {
                        store: redis.clone(),
                        redis: Some(redis),
                        cleanup: None,
                    }
                }
                Err(e) => {
                    warn!("Redis connection failed, running without cache: {}", e);
                    StoreHandles {
                        store: Arc::new(DisabledStore::new(format!("Redis connection failed: {}", e))),
                        redis: None,
                        cleanup: None,
                    }
                }
            }
        }
        StoreBackend::Memory => {
            let memory = MemoryStore::new(config.max_entries);
            let cleanup = spawn_cleanup_task(memory.cache(), config.cleanup_interval);
            StoreHandles {
                store: Arc::new(memory),
                redis: None,
                cleanup: Some(cleanup),
            }
        }
        StoreBackend::Disabled => {
            warn!("Caching disabled; every request will generate a fresh newsletter");
            StoreHandles {
                store: Arc::new(DisabledStore::new("caching disabled by configuration")),
                redis: None,
                cleanup: None,
            }
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
