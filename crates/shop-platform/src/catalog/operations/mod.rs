//! Catalog Operations
//!
//! Queries and commands for categories and products, plus their validators.

mod adjust_stock;
mod create_category;
mod create_product;
mod delete_category;
mod delete_product;
mod get_category;
mod get_product;
mod list_categories;
mod list_products;
mod update_category;

use std::collections::HashMap;
use std::sync::Arc;

pub use adjust_stock::{AdjustStockCommand, AdjustStockHandler, AdjustStockValidator};
pub use create_category::{CreateCategoryCommand, CreateCategoryHandler, CreateCategoryValidator};
pub use create_product::{CreateProductCommand, CreateProductHandler, CreateProductValidator};
pub use delete_category::{CategoryDeleted, DeleteCategoryCommand, DeleteCategoryHandler};
pub use delete_product::{DeleteProductCommand, DeleteProductHandler, ProductDeleted};
pub use get_category::{GetCategoryByIdHandler, GetCategoryByIdQuery};
pub use get_product::{GetProductByIdHandler, GetProductByIdQuery};
pub use list_categories::{ListCategoriesHandler, ListCategoriesQuery};
pub use list_products::{ListProductsHandler, ListProductsQuery};
pub use update_category::{UpdateCategoryCommand, UpdateCategoryHandler, UpdateCategoryValidator};

use super::entity::{Product, ProductDto};
use super::repository::{CategoryRepository, ProductRepository};
use crate::persistence::{StoreError, UnitOfWork};
use crate::pipeline::{DispatcherBuilder, PipelineError};

/// Register every catalog handler and validator.
pub fn register<U: UnitOfWork>(
    builder: &mut DispatcherBuilder<U>,
    categories: Arc<CategoryRepository>,
    products: Arc<ProductRepository>,
) -> Result<(), PipelineError> {
    builder
        .register_handler::<GetCategoryByIdQuery, _>(GetCategoryByIdHandler::new(
            categories.clone(),
        ))?
        .register_handler::<ListCategoriesQuery, _>(ListCategoriesHandler::new(
            categories.clone(),
        ))?
        .register_handler::<CreateCategoryCommand, _>(CreateCategoryHandler::new(
            categories.clone(),
        ))?
        .register_handler::<UpdateCategoryCommand, _>(UpdateCategoryHandler::new(
            categories.clone(),
        ))?
        .register_handler::<DeleteCategoryCommand, _>(DeleteCategoryHandler::new(
            categories.clone(),
            products.clone(),
        ))?
        .register_handler::<GetProductByIdQuery, _>(GetProductByIdHandler::new(
            categories.clone(),
            products.clone(),
        ))?
        .register_handler::<ListProductsQuery, _>(ListProductsHandler::new(
            categories.clone(),
            products.clone(),
        ))?
        .register_handler::<CreateProductCommand, _>(CreateProductHandler::new(
            categories.clone(),
            products.clone(),
        ))?
        .register_handler::<AdjustStockCommand, _>(AdjustStockHandler::new(
            categories.clone(),
            products.clone(),
        ))?
        .register_handler::<DeleteProductCommand, _>(DeleteProductHandler::new(products))?;

    builder
        .register_validator::<CreateCategoryCommand, _>(CreateCategoryValidator)
        .register_validator::<UpdateCategoryCommand, _>(UpdateCategoryValidator)
        .register_validator::<CreateProductCommand, _>(CreateProductValidator)
        .register_validator::<AdjustStockCommand, _>(AdjustStockValidator);

    Ok(())
}

/// Product DTO with the name of its category, if the category still exists.
async fn product_dto(
    categories: &CategoryRepository,
    product: Product,
) -> Result<ProductDto, StoreError> {
    let category_name = categories
        .find_by_id(product.category_id)
        .await?
        .map(|c| c.name);
    Ok(ProductDto::new(product, category_name))
}

/// Category names by id, for list views.
async fn category_names(
    categories: &CategoryRepository,
) -> Result<HashMap<i64, String>, StoreError> {
    Ok(categories
        .find_all()
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}
