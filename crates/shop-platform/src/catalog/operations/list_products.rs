use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::category_names;
use crate::cache::keys;
use crate::catalog::entity::ProductDto;
use crate::catalog::repository::{CategoryRepository, ProductRepository};
use crate::pipeline::{
    CachePolicy, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult,
};

/// Products sorted by name, optionally restricted to one category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl Request for ListProductsQuery {
    type Response = Vec<ProductDto>;
    const NAME: &'static str = "ListProductsQuery";
    const KIND: RequestKind = RequestKind::Query;
    const CACHEABLE: bool = true;

    fn cache_policy(&self) -> Option<CachePolicy> {
        let key = match self.category_id {
            Some(category_id) => keys::products_in_category(category_id),
            None => keys::ALL_PRODUCTS.to_string(),
        };
        Some(CachePolicy::new(key, keys::PRODUCT_LIST_TTL))
    }
}

pub struct ListProductsHandler {
    categories: Arc<CategoryRepository>,
    products: Arc<ProductRepository>,
}

impl ListProductsHandler {
    pub fn new(categories: Arc<CategoryRepository>, products: Arc<ProductRepository>) -> Self {
        Self {
            categories,
            products,
        }
    }
}

#[async_trait]
impl RequestHandler<ListProductsQuery> for ListProductsHandler {
    async fn handle(
        &self,
        request: &ListProductsQuery,
        _ctx: &RequestContext,
    ) -> PipelineResult<Vec<ProductDto>> {
        let products = match request.category_id {
            Some(category_id) => {
                if self.categories.find_by_id(category_id).await?.is_none() {
                    return Ok(RequestResult::not_found(format!(
                        "Category {} not found",
                        category_id
                    )));
                }
                self.products.find_by_category(category_id).await?
            }
            None => self.products.find_all().await?,
        };

        let names = category_names(&self.categories).await?;
        let items = products
            .into_iter()
            .map(|p| {
                let category_name = names.get(&p.category_id).cloned();
                ProductDto::new(p, category_name)
            })
            .collect();

        Ok(RequestResult::success(items))
    }
}
