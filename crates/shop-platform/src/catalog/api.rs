//! Catalog API
//!
//! REST endpoints for categories and products. Handlers only translate HTTP
//! to requests; every rule lives behind the dispatcher.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::operations::{
    AdjustStockCommand, CreateCategoryCommand, CreateProductCommand, DeleteCategoryCommand,
    DeleteProductCommand, GetCategoryByIdQuery, GetProductByIdQuery, ListCategoriesQuery,
    ListProductsQuery, UpdateCategoryCommand,
};
use crate::shared::api_common::{created, ok, parse_id, ApiState, RequestMeta};
use crate::shared::error::PlatformError;

/// Create or update category request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create product request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category_id: Option<String>,
}

async fn list_categories(
    State(state): State<ApiState>,
    meta: RequestMeta,
) -> Result<Response, PlatformError> {
    ok(state.dispatch(ListCategoriesQuery, meta).await)
}

async fn get_category(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Response, PlatformError> {
    let id = parse_id(&id, "category")?;
    ok(state.dispatch(GetCategoryByIdQuery { id }, meta).await)
}

async fn create_category(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Json(req): Json<CategoryRequest>,
) -> Result<Response, PlatformError> {
    let command = CreateCategoryCommand {
        name: req.name,
        description: req.description,
    };
    created(state.dispatch(command, meta).await)
}

async fn update_category(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Path(id): Path<String>,
    Json(req): Json<CategoryRequest>,
) -> Result<Response, PlatformError> {
    let command = UpdateCategoryCommand {
        id: parse_id(&id, "category")?,
        name: req.name,
        description: req.description,
    };
    ok(state.dispatch(command, meta).await)
}

async fn delete_category(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Response, PlatformError> {
    let id = parse_id(&id, "category")?;
    ok(state.dispatch(DeleteCategoryCommand { id }, meta).await)
}

async fn list_category_products(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Response, PlatformError> {
    let query = ListProductsQuery {
        category_id: Some(parse_id(&id, "category")?),
    };
    ok(state.dispatch(query, meta).await)
}

async fn list_products(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Query(filter): Query<ProductFilter>,
) -> Result<Response, PlatformError> {
    let category_id = filter
        .category_id
        .as_deref()
        .map(|raw| parse_id(raw, "category"))
        .transpose()?;
    ok(state.dispatch(ListProductsQuery { category_id }, meta).await)
}

async fn get_product(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Response, PlatformError> {
    let id = parse_id(&id, "product")?;
    ok(state.dispatch(GetProductByIdQuery { id }, meta).await)
}

async fn create_product(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Json(req): Json<CreateProductRequest>,
) -> Result<Response, PlatformError> {
    let command = CreateProductCommand {
        category_id: parse_id(&req.category_id, "category")?,
        name: req.name,
        description: req.description,
        price_cents: req.price_cents,
        stock: req.stock,
    };
    created(state.dispatch(command, meta).await)
}

async fn adjust_stock(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Path(id): Path<String>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Response, PlatformError> {
    let command = AdjustStockCommand {
        product_id: parse_id(&id, "product")?,
        delta: req.delta,
    };
    ok(state.dispatch(command, meta).await)
}

async fn delete_product(
    State(state): State<ApiState>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Response, PlatformError> {
    let id = parse_id(&id, "product")?;
    ok(state.dispatch(DeleteProductCommand { id }, meta).await)
}

pub fn categories_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/:id/products", get(list_category_products))
        .with_state(state)
}

pub fn products_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).delete(delete_product))
        .route("/:id/stock", post(adjust_stock))
        .with_state(state)
}
