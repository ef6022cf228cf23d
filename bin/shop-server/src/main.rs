//! Storefront Server
//!
//! Production server for the storefront REST APIs:
//! - Catalog: `/api/categories`, `/api/products`
//! - Shopping: `/api/cart`, `/api/orders` (customer from `X-Customer-Id`)
//! - Monitoring: `/health`
//!
//! ## Configuration
//!
//! Read from `SHOP_CONFIG` or the standard search paths, then overridden by
//! environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHOP_HTTP_PORT` | `8080` | HTTP API port |
//! | `SHOP_DATABASE_PROVIDER` | `memory` | `memory` or `mongodb` |
//! | `SHOP_DATABASE_URI` | `mongodb://localhost:27017/?replicaSet=rs0&directConnection=true` | MongoDB URL; transactions need a replica set |
//! | `SHOP_DATABASE_NAME` | `storefront` | MongoDB database name |
//! | `SHOP_CACHE_PROVIDER` | `memory` | `memory` or `redis` |
//! | `SHOP_REDIS_URL` | `redis://localhost:6379` | Redis connection URL |
//! | `SHOP_DEV_MODE` | `false` | Seed a sample catalog on startup |
//! | `RUST_LOG` | `info` | Log level |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |

use std::sync::Arc;

use anyhow::Result;
use shop_config::{AppConfig, ConfigLoader};
use shop_platform::cache::RedisCacheStore;
use shop_platform::{
    api_router, build_dispatcher, ApiState, CacheManager, DevDataSeeder, DocumentStore,
    MemoryDocumentStore, MongoDocumentStore,
};
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

async fn document_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.database.provider.as_str() {
        "mongodb" => {
            info!("Connecting to MongoDB: {}", config.database.name);
            let store =
                MongoDocumentStore::connect(&config.database.uri, &config.database.name).await?;
            Ok(Arc::new(store))
        }
        _ => {
            warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

async fn cache_manager(config: &AppConfig) -> Result<CacheManager> {
    match config.cache.provider.as_str() {
        "redis" => {
            let store =
                RedisCacheStore::connect(&config.cache.redis_url, &config.cache.key_prefix)
                    .await?;
            Ok(CacheManager::new(Arc::new(store)))
        }
        _ => {
            info!("Using in-memory cache");
            Ok(CacheManager::in_memory())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    shop_common::logging::init_logging("shop-server");

    info!("Starting Storefront Server");

    let config = ConfigLoader::new().load()?;
    let shutdown = CancellationToken::new();

    let store = document_store(&config).await?;
    let cache = cache_manager(&config).await?;
    let dispatcher = Arc::new(build_dispatcher(store, cache, &config)?);

    if config.dev_mode {
        let seeder = DevDataSeeder::new(dispatcher.clone(), shutdown.child_token());
        if let Err(e) = seeder.seed().await {
            warn!("Dev data seeding skipped: {}", e);
        }
    }

    let state = ApiState::new(dispatcher, shutdown.clone());
    let app = api_router(state, &config.http);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    info!("API server listening on http://{}", addr);
    let listener = TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Storefront Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel in-flight requests.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received...");
    shutdown.cancel();
}
