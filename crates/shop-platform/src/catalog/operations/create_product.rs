//! Create Product

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::product_dto;
use crate::cache::keys;
use crate::catalog::entity::{Product, ProductDto, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};
use crate::catalog::repository::{CategoryRepository, ProductRepository};
use crate::pipeline::{
    PipelineError, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult, ValidationErrors, ValidationFailure, Validator,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductCommand {
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
}

impl Request for CreateProductCommand {
    type Response = ProductDto;
    const NAME: &'static str = "CreateProductCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    fn cache_invalidations(&self) -> Vec<String> {
        vec![keys::PRODUCTS_PATTERN.to_string()]
    }
}

pub struct CreateProductValidator;

#[async_trait]
impl Validator<CreateProductCommand> for CreateProductValidator {
    async fn validate(
        &self,
        request: &CreateProductCommand,
        _ctx: &RequestContext,
    ) -> Result<Vec<ValidationFailure>, PipelineError> {
        let mut errors = ValidationErrors::new();
        errors.text(&request.name, "name", "Name", MAX_NAME_LENGTH);
        if let Some(description) = &request.description {
            errors.check(
                description.chars().count() <= MAX_DESCRIPTION_LENGTH,
                "description",
                "Description is too long",
            );
        }
        errors.check(request.price_cents > 0, "priceCents", "Price must be greater than zero");
        errors.check(request.stock >= 0, "stock", "Stock cannot be negative");
        Ok(errors.into_failures())
    }
}

pub struct CreateProductHandler {
    categories: Arc<CategoryRepository>,
    products: Arc<ProductRepository>,
}

impl CreateProductHandler {
    pub fn new(categories: Arc<CategoryRepository>, products: Arc<ProductRepository>) -> Self {
        Self {
            categories,
            products,
        }
    }
}

#[async_trait]
impl RequestHandler<CreateProductCommand> for CreateProductHandler {
    async fn handle(
        &self,
        request: &CreateProductCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<ProductDto> {
        if self.categories.find_by_id(request.category_id).await?.is_none() {
            return Ok(RequestResult::not_found(format!(
                "Category {} not found",
                request.category_id
            )));
        }

        let name = request.name.trim();
        if self.products.find_by_name(name).await?.is_some() {
            return Ok(RequestResult::conflict(format!(
                "A product named '{}' already exists",
                name
            )));
        }

        let product = Product::new(
            request.category_id,
            name,
            request.description.clone(),
            request.price_cents,
            request.stock,
        );
        self.products.save(&product).await?;
        info!(product_id = product.id, category_id = product.category_id, "Product created");

        Ok(RequestResult::success(
            product_dto(&self.categories, product).await?,
        ))
    }
}
