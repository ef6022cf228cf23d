//! Cart API
//!
//! The cart belongs to the customer named by `X-Customer-Id`.

use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use super::operations::{AddCartItemCommand, GetCartQuery, RemoveCartItemCommand};
use crate::shared::api_common::{ok, parse_id, ApiState, CustomerId, RequestMeta};
use crate::shared::error::PlatformError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

async fn get_cart(
    State(state): State<ApiState>,
    customer: CustomerId,
    meta: RequestMeta,
) -> Result<Response, PlatformError> {
    let query = GetCartQuery { customer_id: customer.0 };
    ok(state.dispatch(query, meta).await)
}

async fn add_item(
    State(state): State<ApiState>,
    customer: CustomerId,
    meta: RequestMeta,
    Json(req): Json<AddItemRequest>,
) -> Result<Response, PlatformError> {
    let command = AddCartItemCommand {
        customer_id: customer.0,
        product_id: parse_id(&req.product_id, "product")?,
        quantity: req.quantity,
    };
    ok(state.dispatch(command, meta).await)
}

async fn remove_item(
    State(state): State<ApiState>,
    customer: CustomerId,
    meta: RequestMeta,
    Path(product_id): Path<String>,
) -> Result<Response, PlatformError> {
    let command = RemoveCartItemCommand {
        customer_id: customer.0,
        product_id: parse_id(&product_id, "product")?,
    };
    ok(state.dispatch(command, meta).await)
}

pub fn cart_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(get_cart))
        .route("/items", post(add_item))
        .route("/items/:product_id", delete(remove_item))
        .with_state(state)
}
