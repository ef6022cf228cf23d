use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cart::entity::CartDto;
use crate::cart::repository::CartRepository;
use crate::pipeline::{
    PipelineResult, Request, RequestContext, RequestHandler, RequestKind, RequestResult,
};

/// The customer's cart; empty when none exists yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCartQuery {
    pub customer_id: i64,
}

impl Request for GetCartQuery {
    type Response = CartDto;
    const NAME: &'static str = "GetCartQuery";
    const KIND: RequestKind = RequestKind::Query;
}

pub struct GetCartHandler {
    carts: Arc<CartRepository>,
}

impl GetCartHandler {
    pub fn new(carts: Arc<CartRepository>) -> Self {
        Self { carts }
    }
}

#[async_trait]
impl RequestHandler<GetCartQuery> for GetCartHandler {
    async fn handle(
        &self,
        request: &GetCartQuery,
        _ctx: &RequestContext,
    ) -> PipelineResult<CartDto> {
        let cart = self.carts.find_or_new(request.customer_id).await?;
        Ok(RequestResult::success(cart.into()))
    }
}
