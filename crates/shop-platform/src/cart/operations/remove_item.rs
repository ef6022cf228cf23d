use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cart::entity::CartDto;
use crate::cart::repository::CartRepository;
use crate::pipeline::{
    PipelineResult, Request, RequestContext, RequestHandler, RequestKind, RequestResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItemCommand {
    pub customer_id: i64,
    pub product_id: i64,
}

impl Request for RemoveCartItemCommand {
    type Response = CartDto;
    const NAME: &'static str = "RemoveCartItemCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;
}

pub struct RemoveCartItemHandler {
    carts: Arc<CartRepository>,
}

impl RemoveCartItemHandler {
    pub fn new(carts: Arc<CartRepository>) -> Self {
        Self { carts }
    }
}

#[async_trait]
impl RequestHandler<RemoveCartItemCommand> for RemoveCartItemHandler {
    async fn handle(
        &self,
        request: &RemoveCartItemCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<CartDto> {
        let not_in_cart = || {
            RequestResult::not_found(format!(
                "Product {} is not in the cart",
                request.product_id
            ))
        };

        let Some(mut cart) = self.carts.find_by_customer(request.customer_id).await? else {
            return Ok(not_in_cart());
        };
        if !cart.remove(request.product_id) {
            return Ok(not_in_cart());
        }
        self.carts.save(&cart).await?;

        Ok(RequestResult::success(cart.into()))
    }
}
