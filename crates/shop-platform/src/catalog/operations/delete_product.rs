use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::catalog::repository::ProductRepository;
use crate::pipeline::{
    PipelineResult, Request, RequestContext, RequestHandler, RequestKind, RequestResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteProductCommand {
    pub id: i64,
}

impl Request for DeleteProductCommand {
    type Response = ProductDeleted;
    const NAME: &'static str = "DeleteProductCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    fn cache_invalidations(&self) -> Vec<String> {
        vec![keys::PRODUCTS_PATTERN.to_string()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDeleted {
    pub id: String,
}

pub struct DeleteProductHandler {
    products: Arc<ProductRepository>,
}

impl DeleteProductHandler {
    pub fn new(products: Arc<ProductRepository>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl RequestHandler<DeleteProductCommand> for DeleteProductHandler {
    async fn handle(
        &self,
        request: &DeleteProductCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<ProductDeleted> {
        if !self.products.delete(request.id).await? {
            return Ok(RequestResult::not_found(format!(
                "Product {} not found",
                request.id
            )));
        }

        Ok(RequestResult::success(ProductDeleted {
            id: request.id.to_string(),
        }))
    }
}
