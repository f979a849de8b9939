use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub title: String,
}

/// Prices are whole minor currency units; negative prices never enter the
/// catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: i64,
    pub category_ids: Vec<i64>,
}
