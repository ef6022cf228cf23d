//! Create Category

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::keys;
use crate::catalog::entity::{Category, CategoryDto, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};
use crate::catalog::repository::CategoryRepository;
use crate::pipeline::{
    PipelineError, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult, ValidationErrors, ValidationFailure, Validator,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryCommand {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Request for CreateCategoryCommand {
    type Response = CategoryDto;
    const NAME: &'static str = "CreateCategoryCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    fn cache_invalidations(&self) -> Vec<String> {
        vec![keys::CATEGORIES_PATTERN.to_string()]
    }
}

pub struct CreateCategoryValidator;

#[async_trait]
impl Validator<CreateCategoryCommand> for CreateCategoryValidator {
    async fn validate(
        &self,
        request: &CreateCategoryCommand,
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
        Ok(errors.into_failures())
    }
}

pub struct CreateCategoryHandler {
    categories: Arc<CategoryRepository>,
}

impl CreateCategoryHandler {
    pub fn new(categories: Arc<CategoryRepository>) -> Self {
        Self { categories }
    }
}

#[async_trait]
impl RequestHandler<CreateCategoryCommand> for CreateCategoryHandler {
    async fn handle(
        &self,
        request: &CreateCategoryCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<CategoryDto> {
        let name = request.name.trim();
        if self.categories.find_by_name(name).await?.is_some() {
            return Ok(RequestResult::conflict(format!(
                "A category named '{}' already exists",
                name
            )));
        }

        let category = Category::new(name, request.description.clone());
        self.categories.save(&category).await?;
        info!(category_id = category.id, "Category created");

        Ok(RequestResult::success(category.into()))
    }
}
