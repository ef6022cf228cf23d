//! Delete Category
//!
//! Removes a category together with every product filed under it, in one
//! unit of work.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::keys;
use crate::catalog::repository::{CategoryRepository, ProductRepository};
use crate::pipeline::{
    PipelineResult, Request, RequestContext, RequestHandler, RequestKind, RequestResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCategoryCommand {
    pub id: i64,
}

impl Request for DeleteCategoryCommand {
    type Response = CategoryDeleted;
    const NAME: &'static str = "DeleteCategoryCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    fn cache_invalidations(&self) -> Vec<String> {
        vec![
            keys::category(self.id),
            keys::CATEGORIES_PATTERN.to_string(),
            keys::PRODUCTS_PATTERN.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDeleted {
    pub id: String,
    pub products_removed: usize,
}

pub struct DeleteCategoryHandler {
    categories: Arc<CategoryRepository>,
    products: Arc<ProductRepository>,
}

impl DeleteCategoryHandler {
    pub fn new(categories: Arc<CategoryRepository>, products: Arc<ProductRepository>) -> Self {
        Self {
            categories,
            products,
        }
    }
}

#[async_trait]
impl RequestHandler<DeleteCategoryCommand> for DeleteCategoryHandler {
    async fn handle(
        &self,
        request: &DeleteCategoryCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<CategoryDeleted> {
        if self.categories.find_by_id(request.id).await?.is_none() {
            return Ok(RequestResult::not_found(format!(
                "Category {} not found",
                request.id
            )));
        }

        let products = self.products.find_by_category(request.id).await?;
        for product in &products {
            self.products.delete(product.id).await?;
        }
        self.categories.delete(request.id).await?;

        info!(
            category_id = request.id,
            products_removed = products.len(),
            "Category deleted"
        );

        Ok(RequestResult::success(CategoryDeleted {
            id: request.id.to_string(),
            products_removed: products.len(),
        }))
    }
}
