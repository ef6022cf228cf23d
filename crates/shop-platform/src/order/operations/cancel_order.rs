//! Cancel Order

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::keys;
use crate::catalog::ProductRepository;
use crate::order::entity::OrderDto;
use crate::order::repository::OrderRepository;
use crate::pipeline::{
    PipelineResult, Request, RequestContext, RequestHandler, RequestKind, RequestResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderCommand {
    pub id: i64,
    pub customer_id: i64,
}

impl Request for CancelOrderCommand {
    type Response = OrderDto;
    const NAME: &'static str = "CancelOrderCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    fn cache_invalidations(&self) -> Vec<String> {
        vec![keys::PRODUCTS_PATTERN.to_string()]
    }
}

pub struct CancelOrderHandler {
    orders: Arc<OrderRepository>,
    products: Arc<ProductRepository>,
}

impl CancelOrderHandler {
    pub fn new(orders: Arc<OrderRepository>, products: Arc<ProductRepository>) -> Self {
        Self { orders, products }
    }
}

#[async_trait]
impl RequestHandler<CancelOrderCommand> for CancelOrderHandler {
    async fn handle(
        &self,
        request: &CancelOrderCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<OrderDto> {
        let Some(mut order) = self.orders.find_by_id(request.id).await? else {
            return Ok(RequestResult::not_found(format!(
                "Order {} not found",
                request.id
            )));
        };
        if order.customer_id != request.customer_id {
            return Ok(RequestResult::Forbidden);
        }
        if order.is_cancelled() {
            return Ok(RequestResult::conflict(format!(
                "Order {} is already cancelled",
                order.id
            )));
        }

        for line in &order.lines {
            match self.products.find_by_id(line.product_id).await? {
                Some(mut product) => {
                    product.adjust_stock(i64::from(line.quantity));
                    self.products.save(&product).await?;
                }
                None => warn!(
                    order_id = order.id,
                    product_id = line.product_id,
                    "Product removed since the order was placed, not restocking"
                ),
            }
        }

        order.cancel();
        self.orders.save(&order).await?;
        info!(order_id = order.id, "Order cancelled");

        Ok(RequestResult::success(order.into()))
    }
}
