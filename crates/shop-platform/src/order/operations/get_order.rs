use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::order::entity::OrderDto;
use crate::order::repository::OrderRepository;
use crate::pipeline::{
    PipelineResult, Request, RequestContext, RequestHandler, RequestKind, RequestResult,
};

/// An order, visible only to the customer who placed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderByIdQuery {
    pub id: i64,
    pub customer_id: i64,
}

impl Request for GetOrderByIdQuery {
    type Response = OrderDto;
    const NAME: &'static str = "GetOrderByIdQuery";
    const KIND: RequestKind = RequestKind::Query;
}

pub struct GetOrderByIdHandler {
    orders: Arc<OrderRepository>,
}

impl GetOrderByIdHandler {
    pub fn new(orders: Arc<OrderRepository>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl RequestHandler<GetOrderByIdQuery> for GetOrderByIdHandler {
    async fn handle(
        &self,
        request: &GetOrderByIdQuery,
        _ctx: &RequestContext,
    ) -> PipelineResult<OrderDto> {
        Ok(match self.orders.find_by_id(request.id).await? {
            None => RequestResult::not_found(format!("Order {} not found", request.id)),
            Some(order) if order.customer_id != request.customer_id => RequestResult::Forbidden,
            Some(order) => RequestResult::success(order.into()),
        })
    }
}
