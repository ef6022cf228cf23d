//! Cache key vocabulary shared by the catalog queries and the commands that
//! invalidate them.

use std::time::Duration;

pub const CATEGORY_TTL: Duration = Duration::from_secs(2 * 60 * 60);
pub const CATEGORY_LIST_TTL: Duration = Duration::from_secs(2 * 60 * 60);
pub const PRODUCT_TTL: Duration = Duration::from_secs(60 * 60);
pub const PRODUCT_LIST_TTL: Duration = Duration::from_secs(30 * 60);

pub const ALL_CATEGORIES: &str = "categories:all";
pub const CATEGORIES_PATTERN: &str = "categories:*";
pub const ALL_PRODUCTS: &str = "products:all";
pub const PRODUCTS_PATTERN: &str = "products:*";

pub fn category(id: i64) -> String {
    format!("category:{}", id)
}

pub fn product(id: i64) -> String {
    format!("products:{}", id)
}

pub fn products_in_category(category_id: i64) -> String {
    format!("products:category:{}", category_id)
}
