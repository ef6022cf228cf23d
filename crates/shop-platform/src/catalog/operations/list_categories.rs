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

/// All categories, sorted by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCategoriesQuery;

impl Request for ListCategoriesQuery {
    type Response = Vec<CategoryDto>;
    const NAME: &'static str = "ListCategoriesQuery";
    const KIND: RequestKind = RequestKind::Query;
    const CACHEABLE: bool = true;

    fn cache_policy(&self) -> Option<CachePolicy> {
        Some(CachePolicy::new(keys::ALL_CATEGORIES, keys::CATEGORY_LIST_TTL))
    }
}

pub struct ListCategoriesHandler {
    categories: Arc<CategoryRepository>,
}

impl ListCategoriesHandler {
    pub fn new(categories: Arc<CategoryRepository>) -> Self {
        Self { categories }
    }
}

#[async_trait]
impl RequestHandler<ListCategoriesQuery> for ListCategoriesHandler {
    async fn handle(
        &self,
        _request: &ListCategoriesQuery,
        _ctx: &RequestContext,
    ) -> PipelineResult<Vec<CategoryDto>> {
        let categories = self.categories.find_all().await?;
        Ok(RequestResult::success(
            categories.into_iter().map(CategoryDto::from).collect(),
        ))
    }
}
