use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::product_dto;
use crate::cache::keys;
use crate::catalog::entity::ProductDto;
use crate::catalog::repository::{CategoryRepository, ProductRepository};
use crate::pipeline::{
    CachePolicy, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetProductByIdQuery {
    pub id: i64,
}

impl Request for GetProductByIdQuery {
    type Response = ProductDto;
    const NAME: &'static str = "GetProductByIdQuery";
    const KIND: RequestKind = RequestKind::Query;
    const CACHEABLE: bool = true;

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(keys::product(self.id), keys::PRODUCT_TTL))
    }
}

pub struct GetProductByIdHandler {
    categories: Arc<CategoryRepository>,
    products: Arc<ProductRepository>,
}

impl GetProductByIdHandler {
    pub fn new(categories: Arc<CategoryRepository>, products: Arc<ProductRepository>) -> Self {
        Self {
            categories,
            products,
        }
    }
}

#[async_trait]
impl RequestHandler<GetProductByIdQuery> for GetProductByIdHandler {
    async fn handle(
        &self,
        request: &GetProductByIdQuery,
        _ctx: &RequestContext,
    ) -> PipelineResult<ProductDto> {
        match self.products.find_by_id(request.id).await? {
            Some(product) => Ok(RequestResult::success(
                product_dto(&self.categories, product).await?,
            )),
            None => Ok(RequestResult::not_found(format!(
                "Product {} not found",
                request.id
            ))),
        }
    }
}
