use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::order::entity::OrderDto;
use crate::order::repository::OrderRepository;
use crate::pipeline::{
    PipelineResult, Request, RequestContext, RequestHandler, RequestKind, RequestResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub customer_id: i64,
}

impl Request for ListOrdersQuery {
    type Response = Vec<OrderDto>;
    const NAME: &'static str = "ListOrdersQuery";
    const KIND: RequestKind = RequestKind::Query;
}

pub struct ListOrdersHandler {
    orders: Arc<OrderRepository>,
}

impl ListOrdersHandler {
    pub fn new(orders: Arc<OrderRepository>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl RequestHandler<ListOrdersQuery> for ListOrdersHandler {
    async fn handle(
        &self,
        request: &ListOrdersQuery,
        _ctx: &RequestContext,
    ) -> PipelineResult<Vec<OrderDto>> {
        let orders = self.orders.find_by_customer(request.customer_id).await?;
        Ok(RequestResult::success(
            orders.into_iter().map(OrderDto::from).collect(),
        ))
    }
}
