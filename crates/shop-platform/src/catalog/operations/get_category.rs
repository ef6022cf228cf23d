use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::catalog::entity::CategoryDto;
use crate::catalog::repository::CategoryRepository;
use crate::pipeline::{
    CachePolicy, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCategoryByIdQuery {
    pub id: i64,
}

impl Request for GetCategoryByIdQuery {
    type Response = CategoryDto;
    const NAME: &'static str = "GetCategoryByIdQuery";
    const KIND: RequestKind = RequestKind::Query;
    const CACHEABLE: bool = true;

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(keys::category(self.id), keys::CATEGORY_TTL))
    }
}

pub struct GetCategoryByIdHandler {
    categories: Arc<CategoryRepository>,
}

impl GetCategoryByIdHandler {
    pub fn new(categories: Arc<CategoryRepository>) -> Self {
        Self { categories }
    }
}

#[async_trait]
impl RequestHandler<GetCategoryByIdQuery> for GetCategoryByIdHandler {
    async fn handle(
        &self,
        request: &GetCategoryByIdQuery,
        _ctx: &RequestContext,
    ) -> PipelineResult<CategoryDto> {
        Ok(match self.categories.find_by_id(request.id).await? {
            Some(category) => RequestResult::success(category.into()),
            None => RequestResult::not_found(format!("Category {} not found", request.id)),
        })
    }
}
