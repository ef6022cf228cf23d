//! Adjust Stock

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::product_dto;
use crate::cache::keys;
use crate::catalog::entity::ProductDto;
use crate::catalog::repository::{CategoryRepository, ProductRepository};
use crate::pipeline::{
    PipelineError, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult, ValidationErrors, ValidationFailure, Validator,
};

/// Add (positive delta) or remove (negative delta) units of stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockCommand {
    pub product_id: i64,
    pub delta: i64,
}

impl Request for AdjustStockCommand {
    type Response = ProductDto;
    const NAME: &'static str = "AdjustStockCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    fn cache_invalidations(&self) -> Vec<String> {
        vec![keys::PRODUCTS_PATTERN.to_string()]
    }
}

pub struct AdjustStockValidator;

#[async_trait]
impl Validator<AdjustStockCommand> for AdjustStockValidator {
    async fn validate(
        &self,
        request: &AdjustStockCommand,
        _ctx: &RequestContext,
    ) -> Result<Vec<ValidationFailure>, PipelineError> {
        let mut errors = ValidationErrors::new();
        errors.check(request.delta != 0, "delta", "Delta must not be zero");
        Ok(errors.into_failures())
    }
}

pub struct AdjustStockHandler {
    categories: Arc<CategoryRepository>,
    products: Arc<ProductRepository>,
}

impl AdjustStockHandler {
    pub fn new(categories: Arc<CategoryRepository>, products: Arc<ProductRepository>) -> Self {
        Self {
            categories,
            products,
        }
    }
}

#[async_trait]
impl RequestHandler<AdjustStockCommand> for AdjustStockHandler {
    async fn handle(
        &self,
        request: &AdjustStockCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<ProductDto> {
        let Some(mut product) = self.products.find_by_id(request.product_id).await? else {
            return Ok(RequestResult::not_found(format!(
                "Product {} not found",
                request.product_id
            )));
        };

        if !product.adjust_stock(request.delta) {
            return Ok(RequestResult::conflict(format!(
                "Insufficient stock for '{}': {} available",
                product.name, product.stock
            )));
        }

        self.products.save(&product).await?;
        Ok(RequestResult::success(
            product_dto(&self.categories, product).await?,
        ))
    }
}
