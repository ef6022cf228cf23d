//! Order Operations

mod cancel_order;
mod get_order;
mod list_orders;
mod place_order;

use std::sync::Arc;

pub use cancel_order::{CancelOrderCommand, CancelOrderHandler};
pub use get_order::{GetOrderByIdHandler, GetOrderByIdQuery};
pub use list_orders::{ListOrdersHandler, ListOrdersQuery};
pub use place_order::{PlaceOrderCommand, PlaceOrderHandler};

use super::repository::OrderRepository;
use crate::cart::CartRepository;
use crate::catalog::ProductRepository;
use crate::persistence::UnitOfWork;
use crate::pipeline::{DispatcherBuilder, PipelineError};

pub fn register<U: UnitOfWork>(
    builder: &mut DispatcherBuilder<U>,
    orders: Arc<OrderRepository>,
    carts: Arc<CartRepository>,
    products: Arc<ProductRepository>,
) -> Result<(), PipelineError> {
    builder
        .register_handler::<PlaceOrderCommand, _>(PlaceOrderHandler::new(
            orders.clone(),
            carts,
            products.clone(),
        ))?
        .register_handler::<GetOrderByIdQuery, _>(GetOrderByIdHandler::new(orders.clone()))?
        .register_handler::<ListOrdersQuery, _>(ListOrdersHandler::new(orders.clone()))?
        .register_handler::<CancelOrderCommand, _>(CancelOrderHandler::new(orders, products))?;
    Ok(())
}
