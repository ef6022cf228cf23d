//! Catalog Aggregate
//!
//! Categories and the products filed under them. Reads are cached; every
//! write invalidates the cache keys that could have observed it.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

pub use api::{categories_router, products_router};
pub use entity::{Category, CategoryDto, Product, ProductDto};
pub use repository::{CategoryRepository, ProductRepository};
