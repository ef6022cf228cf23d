//! Development Data Seeder
//!
//! Seeds a small catalog on startup in dev mode. Everything goes through the
//! dispatcher, so seeding exercises the same validation and transactions as
//! the API.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::catalog::operations::{CreateCategoryCommand, CreateProductCommand, ListCategoriesQuery};
use crate::pipeline::{Dispatcher, PipelineError, Request, RequestResult};

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    stock: i64,
}

const SEED_CATALOG: &[(&str, &str, &[SeedProduct])] = &[
    (
        "Books",
        "Printed and digital books",
        &[
            SeedProduct {
                name: "The Rust Programming Language",
                description: "The official book on Rust",
                price_cents: 3999,
                stock: 25,
            },
            SeedProduct {
                name: "Designing Data-Intensive Applications",
                description: "Reliable, scalable and maintainable systems",
                price_cents: 4599,
                stock: 10,
            },
        ],
    ),
    (
        "Electronics",
        "Gadgets and accessories",
        &[
            SeedProduct {
                name: "Mechanical Keyboard",
                description: "Tenkeyless, brown switches",
                price_cents: 8900,
                stock: 15,
            },
            SeedProduct {
                name: "USB-C Hub",
                description: "7-in-1 adapter",
                price_cents: 2999,
                stock: 40,
            },
        ],
    ),
];

/// Development data seeder
pub struct DevDataSeeder {
    dispatcher: Arc<Dispatcher>,
    cancellation: CancellationToken,
}

impl DevDataSeeder {
    pub fn new(dispatcher: Arc<Dispatcher>, cancellation: CancellationToken) -> Self {
        Self {
            dispatcher,
            cancellation,
        }
    }

    /// Seed the sample catalog unless categories already exist.
    ///
    /// Returns the number of products created.
    pub async fn seed(&self) -> Result<usize, PipelineError> {
        let existing = self.send(ListCategoriesQuery).await?;
        if !existing.is_empty() {
            info!(categories = existing.len(), "Catalog already populated, skipping seed");
            return Ok(0);
        }

        info!("Seeding development catalog...");
        let mut products = 0;
        for (name, description, items) in SEED_CATALOG {
            let category = self
                .send(CreateCategoryCommand {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                })
                .await?;
            let category_id = category
                .id
                .parse::<i64>()
                .map_err(|e| PipelineError::handler(format!("seeded category id: {}", e)))?;

            for item in items.iter() {
                self.send(CreateProductCommand {
                    category_id,
                    name: item.name.to_string(),
                    description: Some(item.description.to_string()),
                    price_cents: item.price_cents,
                    stock: item.stock,
                })
                .await?;
                products += 1;
            }
            info!(category = %name, "Seeded category");
        }

        info!(products, "Development catalog seeded");
        Ok(products)
    }

    async fn send<R: Request>(&self, request: R) -> Result<R::Response, PipelineError> {
        match self.dispatcher.dispatch(request, self.cancellation.child_token()).await? {
            RequestResult::Success(value) => Ok(value),
            outcome => Err(PipelineError::handler(format!(
                "{} returned {}: {}",
                R::NAME,
                outcome.tag(),
                outcome.message().unwrap_or_default()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheManager;
    use crate::persistence::MemoryDocumentStore;
    use crate::platform::build_dispatcher;
    use shop_config::AppConfig;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = Arc::new(MemoryDocumentStore::new());
        let dispatcher =
            build_dispatcher(store.clone(), CacheManager::in_memory(), &AppConfig::default())
                .unwrap();
        let seeder = DevDataSeeder::new(Arc::new(dispatcher), CancellationToken::new());

        assert_eq!(seeder.seed().await.unwrap(), 4);
        assert_eq!(store.count("categories"), 2);
        assert_eq!(store.count("products"), 4);

        assert_eq!(seeder.seed().await.unwrap(), 0);
        assert_eq!(store.count("products"), 4);
    }
}
