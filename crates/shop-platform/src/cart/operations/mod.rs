//! Cart Operations

mod add_item;
mod get_cart;
mod remove_item;

use std::sync::Arc;

pub use add_item::{AddCartItemCommand, AddCartItemHandler, AddCartItemValidator};
pub use get_cart::{GetCartHandler, GetCartQuery};
pub use remove_item::{RemoveCartItemCommand, RemoveCartItemHandler};

use super::repository::CartRepository;
use crate::catalog::ProductRepository;
use crate::persistence::UnitOfWork;
use crate::pipeline::{DispatcherBuilder, PipelineError};

pub fn register<U: UnitOfWork>(
    builder: &mut DispatcherBuilder<U>,
    carts: Arc<CartRepository>,
    products: Arc<ProductRepository>,
    max_items: u32,
) -> Result<(), PipelineError> {
    builder
        .register_handler::<GetCartQuery, _>(GetCartHandler::new(carts.clone()))?
        .register_handler::<AddCartItemCommand, _>(AddCartItemHandler::new(
            carts.clone(),
            products,
            max_items,
        ))?
        .register_handler::<RemoveCartItemCommand, _>(RemoveCartItemHandler::new(carts))?;

    builder.register_validator::<AddCartItemCommand, _>(AddCartItemValidator);
    Ok(())
}
