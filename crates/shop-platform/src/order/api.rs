//! Orders API

use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Router,
};

use super::operations::{CancelOrderCommand, GetOrderByIdQuery, ListOrdersQuery, PlaceOrderCommand};
use crate::shared::api_common::{created, ok, parse_id, ApiState, CustomerId, RequestMeta};
use crate::shared::error::PlatformError;

async fn list_orders(
    State(state): State<ApiState>,
    customer: CustomerId,
    meta: RequestMeta,
) -> Result<Response, PlatformError> {
    let query = ListOrdersQuery { customer_id: customer.0 };
    ok(state.dispatch(query, meta).await)
}

/// Place an order from the customer's current cart.
async fn place_order(
    State(state): State<ApiState>,
    customer: CustomerId,
    meta: RequestMeta,
) -> Result<Response, PlatformError> {
    let command = PlaceOrderCommand { customer_id: customer.0 };
    created(state.dispatch(command, meta).await)
}

async fn get_order(
    State(state): State<ApiState>,
    customer: CustomerId,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Response, PlatformError> {
    let query = GetOrderByIdQuery {
        id: parse_id(&id, "order")?,
        customer_id: customer.0,
    };
    ok(state.dispatch(query, meta).await)
}

async fn cancel_order(
    State(state): State<ApiState>,
    customer: CustomerId,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Response, PlatformError> {
    let command = CancelOrderCommand {
        id: parse_id(&id, "order")?,
        customer_id: customer.0,
    };
    ok(state.dispatch(command, meta).await)
}

pub fn orders_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/:id", get(get_order))
        .route("/:id/cancel", post(cancel_order))
        .with_state(state)
}
