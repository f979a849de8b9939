use async_trait::async_trait;

use crate::domain::catalog::{Category, Product};
use crate::ports::StoreError;

/// System of record for products and their category labels.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    async fn add_category(&self, title: &str) -> Result<Category, StoreError>;

    /// Registers a sellable product. Every id in `category_ids` must name
    /// an existing category.
    async fn add_product(
        &self,
        title: &str,
        price: i64,
        category_ids: &[i64],
    ) -> Result<Product, StoreError>;

    /// Fetches the products that exist among `ids`, in requested order.
    /// Unknown ids are skipped, not errors.
    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, StoreError>;

    async fn categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, StoreError>;
}
