use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::Category;

/// A purchase record linking one user to one or more catalog products.
/// Created once, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub product_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Collapses duplicate product ids, keeping the first occurrence of
    /// each. A request naming the same product twice links it once.
    pub fn normalize_product_ids(ids: &[i64]) -> Vec<i64> {
        let mut seen = std::collections::HashSet::new();
        ids.iter().copied().filter(|id| seen.insert(*id)).collect()
    }
}

// API-facing shapes. Field names are the wire contract: an order's products
// serialize under "product", each product's categories under "category".

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryView {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    pub id: i64,
    pub title: String,
    pub price: i64,
    pub category: Vec<CategoryView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: i64,
    pub user: i64,
    pub product: Vec<ProductView>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            title: category.title.clone(),
        }
    }
}
