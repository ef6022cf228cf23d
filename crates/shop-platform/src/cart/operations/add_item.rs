//! Add Cart Item

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cart::entity::CartDto;
use crate::cart::repository::CartRepository;
use crate::catalog::ProductRepository;
use crate::pipeline::{
    PipelineError, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult, ValidationErrors, ValidationFailure, Validator,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemCommand {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: u32,
}

impl Request for AddCartItemCommand {
    type Response = CartDto;
    const NAME: &'static str = "AddCartItemCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;
}

pub struct AddCartItemValidator;

#[async_trait]
impl Validator<AddCartItemCommand> for AddCartItemValidator {
    async fn validate(
        &self,
        request: &AddCartItemCommand,
        _ctx: &RequestContext,
    ) -> Result<Vec<ValidationFailure>, PipelineError> {
        let mut errors = ValidationErrors::new();
        errors.check(request.quantity > 0, "quantity", "Quantity must be at least 1");
        Ok(errors.into_failures())
    }
}

pub struct AddCartItemHandler {
    carts: Arc<CartRepository>,
    products: Arc<ProductRepository>,
    max_items: u32,
}

impl AddCartItemHandler {
    pub fn new(
        carts: Arc<CartRepository>,
        products: Arc<ProductRepository>,
        max_items: u32,
    ) -> Self {
        Self {
            carts,
            products,
            max_items,
        }
    }
}

#[async_trait]
impl RequestHandler<AddCartItemCommand> for AddCartItemHandler {
    async fn handle(
        &self,
        request: &AddCartItemCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<CartDto> {
        let Some(product) = self.products.find_by_id(request.product_id).await? else {
            return Ok(RequestResult::not_found(format!(
                "Product {} not found",
                request.product_id
            )));
        };

        let mut cart = self.carts.find_or_new(request.customer_id).await?;

        let wanted = i64::from(cart.quantity_of(product.id)) + i64::from(request.quantity);
        if wanted > product.stock {
            return Ok(RequestResult::conflict(format!(
                "Only {} of '{}' in stock",
                product.stock, product.name
            )));
        }

        if cart.total_quantity().saturating_add(request.quantity) > self.max_items {
            return Ok(RequestResult::conflict(format!(
                "A cart can hold at most {} items",
                self.max_items
            )));
        }

        cart.add(product.id, &product.name, product.price_cents, request.quantity);
        self.carts.save(&cart).await?;
        debug!(
            customer_id = request.customer_id,
            product_id = product.id,
            quantity = request.quantity,
            "Item added to cart"
        );

        Ok(RequestResult::success(cart.into()))
    }
}
