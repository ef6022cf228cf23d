//! Place Order
//!
//! Turns the customer's cart into an order: takes stock for every line,
//! records the order and empties the cart, all in one unit of work.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::keys;
use crate::cart::CartRepository;
use crate::catalog::{Product, ProductRepository};
use crate::order::entity::{Order, OrderDto, OrderLine};
use crate::order::repository::OrderRepository;
use crate::pipeline::{
    PipelineResult, Request, RequestContext, RequestHandler, RequestKind, RequestResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderCommand {
    pub customer_id: i64,
}

impl Request for PlaceOrderCommand {
    type Response = OrderDto;
    const NAME: &'static str = "PlaceOrderCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    fn cache_invalidations(&self) -> Vec<String> {
        vec![keys::PRODUCTS_PATTERN.to_string()]
    }
}

pub struct PlaceOrderHandler {
    orders: Arc<OrderRepository>,
    carts: Arc<CartRepository>,
    products: Arc<ProductRepository>,
}

impl PlaceOrderHandler {
    pub fn new(
        orders: Arc<OrderRepository>,
        carts: Arc<CartRepository>,
        products: Arc<ProductRepository>,
    ) -> Self {
        Self {
            orders,
            carts,
            products,
        }
    }
}

#[async_trait]
impl RequestHandler<PlaceOrderCommand> for PlaceOrderHandler {
    async fn handle(
        &self,
        request: &PlaceOrderCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<OrderDto> {
        let cart = match self.carts.find_by_customer(request.customer_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Ok(RequestResult::conflict("Cart is empty")),
        };

        // Stock is taken on in-memory copies first and nothing is written
        // until every line succeeded: non-success outcomes still commit.
        let mut reserved: Vec<(Product, u32)> = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let Some(mut product) = self.products.find_by_id(item.product_id).await? else {
                return Ok(RequestResult::conflict(format!(
                    "'{}' is no longer available",
                    item.product_name
                )));
            };
            if !product.adjust_stock(-i64::from(item.quantity)) {
                return Ok(RequestResult::conflict(format!(
                    "Only {} of '{}' in stock",
                    product.stock, product.name
                )));
            }
            reserved.push((product, item.quantity));
        }

        let mut lines = Vec::with_capacity(reserved.len());
        for (product, quantity) in reserved {
            self.products.save(&product).await?;
            lines.push(OrderLine {
                product_id: product.id,
                product_name: product.name,
                unit_price_cents: product.price_cents,
                quantity,
            });
        }

        let order = Order::place(request.customer_id, lines);
        self.orders.save(&order).await?;
        self.carts.delete(request.customer_id).await?;

        info!(
            order_id = order.id,
            customer_id = order.customer_id,
            total_cents = order.total_cents,
            "Order placed"
        );

        Ok(RequestResult::success(order.into()))
    }
}
