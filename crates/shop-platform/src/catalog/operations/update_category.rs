//! Update Category

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::catalog::entity::{CategoryDto, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};
use crate::catalog::repository::CategoryRepository;
use crate::pipeline::{
    PipelineError, PipelineResult, Request, RequestContext, RequestHandler, RequestKind,
    RequestResult, ValidationErrors, ValidationFailure, Validator,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryCommand {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Request for UpdateCategoryCommand {
    type Response = CategoryDto;
    const NAME: &'static str = "UpdateCategoryCommand";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;

    /// Product DTOs embed the category name, so they go too.
    fn cache_invalidations(&self) -> Vec<String> {
        vec![
            keys::category(self.id),
            keys::CATEGORIES_PATTERN.to_string(),
            keys::PRODUCTS_PATTERN.to_string(),
        ]
    }
}

pub struct UpdateCategoryValidator;

#[async_trait]
impl Validator<UpdateCategoryCommand> for UpdateCategoryValidator {
    async fn validate(
        &self,
        request: &UpdateCategoryCommand,
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

pub struct UpdateCategoryHandler {
    categories: Arc<CategoryRepository>,
}

impl UpdateCategoryHandler {
    pub fn new(categories: Arc<CategoryRepository>) -> Self {
        Self { categories }
    }
}

#[async_trait]
impl RequestHandler<UpdateCategoryCommand> for UpdateCategoryHandler {
    async fn handle(
        &self,
        request: &UpdateCategoryCommand,
        _ctx: &RequestContext,
    ) -> PipelineResult<CategoryDto> {
        let Some(mut category) = self.categories.find_by_id(request.id).await? else {
            return Ok(RequestResult::not_found(format!(
                "Category {} not found",
                request.id
            )));
        };

        let name = request.name.trim();
        if let Some(existing) = self.categories.find_by_name(name).await? {
            if existing.id != category.id {
                return Ok(RequestResult::conflict(format!(
                    "A category named '{}' already exists",
                    name
                )));
            }
        }

        category.rename(name, request.description.clone());
        self.categories.save(&category).await?;

        Ok(RequestResult::success(category.into()))
    }
}
