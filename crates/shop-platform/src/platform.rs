//! Platform wiring
//!
//! Builds repositories, the request dispatcher and the HTTP router from one
//! document store, one cache and the application config.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use shop_config::{AppConfig, HttpConfig};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::cache::CacheManager;
use crate::cart::{cart_router, CartRepository};
use crate::catalog::{categories_router, products_router, CategoryRepository, ProductRepository};
use crate::order::{orders_router, OrderRepository};
use crate::persistence::{DocumentStore, RetryPolicy, StoreUnitOfWork, UnitOfWork};
use crate::pipeline::{Dispatcher, DispatcherBuilder, PipelineError};
use crate::shared::{health_router, ApiState};

/// Every aggregate repository over one document store.
#[derive(Clone)]
pub struct Repositories {
    pub categories: Arc<CategoryRepository>,
    pub products: Arc<ProductRepository>,
    pub carts: Arc<CartRepository>,
    pub orders: Arc<OrderRepository>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            categories: Arc::new(CategoryRepository::new(store.clone())),
            products: Arc::new(ProductRepository::new(store.clone())),
            carts: Arc::new(CartRepository::new(store.clone())),
            orders: Arc::new(OrderRepository::new(store)),
        }
    }
}

/// Register every catalog, cart and order handler on `builder`.
pub fn register_all<U: UnitOfWork>(
    builder: &mut DispatcherBuilder<U>,
    repos: &Repositories,
    config: &AppConfig,
) -> Result<(), PipelineError> {
    crate::catalog::operations::register(
        builder,
        repos.categories.clone(),
        repos.products.clone(),
    )?;
    crate::cart::operations::register(
        builder,
        repos.carts.clone(),
        repos.products.clone(),
        config.cart.max_items,
    )?;
    crate::order::operations::register(
        builder,
        repos.orders.clone(),
        repos.carts.clone(),
        repos.products.clone(),
    )?;
    Ok(())
}

/// Build the production dispatcher: store-backed unit of work with the
/// configured retry policy.
pub fn build_dispatcher(
    store: Arc<dyn DocumentStore>,
    cache: CacheManager,
    config: &AppConfig,
) -> Result<Dispatcher, PipelineError> {
    let unit_of_work = Arc::new(StoreUnitOfWork::new(
        store.clone(),
        RetryPolicy::from_config(&config.transaction),
    ));
    let repos = Repositories::new(store);

    let mut builder = Dispatcher::builder(cache, unit_of_work);
    register_all(&mut builder, &repos, config)?;
    Ok(builder.build())
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if http.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = http
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// HTTP API for every aggregate plus `/health`.
pub fn api_router(state: ApiState, http: &HttpConfig) -> Router {
    Router::new()
        .nest("/api/categories", categories_router(state.clone()))
        .nest("/api/products", products_router(state.clone()))
        .nest("/api/cart", cart_router(state.clone()))
        .nest("/api/orders", orders_router(state))
        .nest("/health", health_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(http))
}
