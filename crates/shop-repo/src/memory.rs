use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use shop_types::domain::catalog::{Category, Product};
use shop_types::domain::order::Order;
use shop_types::domain::user::User;
use shop_types::ports::catalog_store::CatalogStore;
use shop_types::ports::identity_store::IdentityStore;
use shop_types::ports::order_repository::{OrderListQuery, OrderListing, OrderRepository};
use shop_types::ports::StoreError;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryStore {
    users: Arc<DashMap<i64, User>>,
    tokens: Arc<DashMap<String, i64>>,
    categories: Arc<DashMap<i64, Category>>,
    products: Arc<DashMap<i64, Product>>,
    // An order's product links live inside its map entry, so inserting an
    // order is a single atomic write.
    orders: Arc<DashMap<i64, Order>>,
    user_seq: Arc<AtomicI64>,
    category_seq: Arc<AtomicI64>,
    product_seq: Arc<AtomicI64>,
    order_seq: Arc<AtomicI64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            tokens: Arc::new(DashMap::new()),
            categories: Arc::new(DashMap::new()),
            products: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            user_seq: Arc::new(AtomicI64::new(0)),
            category_seq: Arc::new(AtomicI64::new(0)),
            product_seq: Arc::new(AtomicI64::new(0)),
            order_seq: Arc::new(AtomicI64::new(0)),
        }
    }

    fn next_id(seq: &AtomicI64) -> i64 {
        seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create(&self, user_id: i64, product_ids: &[i64]) -> Result<Order, StoreError> {
        let product_ids = Order::normalize_product_ids(product_ids);
        if product_ids.is_empty() {
            return Err(StoreError::EmptyProducts);
        }
        if !self.users.contains_key(&user_id) {
            return Err(StoreError::UserNotFound(user_id));
        }
        let missing: Vec<i64> = product_ids
            .iter()
            .copied()
            .filter(|id| !self.products.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::UnknownProducts(missing));
        }

        let id = Self::next_id(&self.order_seq);
        let order = Order {
            id,
            user_id,
            product_ids,
            created_at: Utc::now(),
        };
        self.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn list(&self, query: OrderListQuery) -> Result<OrderListing, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .map(|kv| kv.value().clone())
            .filter(|o| query.user_id.map_or(true, |u| o.user_id == u))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = orders.len() as i64;
        let orders = orders
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok(OrderListing { orders, total })
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn add_category(&self, title: &str) -> Result<Category, StoreError> {
        let id = Self::next_id(&self.category_seq);
        let category = Category {
            id,
            title: title.to_string(),
        };
        self.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn add_product(
        &self,
        title: &str,
        price: i64,
        category_ids: &[i64],
    ) -> Result<Product, StoreError> {
        if price < 0 {
            return Err(StoreError::NegativePrice);
        }
        let mut unique = Vec::new();
        for id in category_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        let missing: Vec<i64> = unique
            .iter()
            .copied()
            .filter(|id| !self.categories.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::UnknownCategories(missing));
        }

        let id = Self::next_id(&self.product_seq);
        let product = Product {
            id,
            title: title.to_string(),
            price,
            category_ids: unique,
        };
        self.products.insert(id, product.clone());
        Ok(product)
    }

    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.products.get(id).map(|p| p.clone()))
            .collect())
    }

    async fn categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.categories.get(id).map(|c| c.clone()))
            .collect())
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn add_user(&self, username: &str, email: &str) -> Result<User, StoreError> {
        let id = Self::next_id(&self.user_seq);
        let user = User {
            id,
            username: username.to_string(),
            email: email.to_string(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn issue_token(&self, user_id: i64) -> Result<String, StoreError> {
        if !self.users.contains_key(&user_id) {
            return Err(StoreError::UserNotFound(user_id));
        }
        // One live key per user.
        self.tokens.retain(|_, uid| *uid != user_id);
        let key = Uuid::new_v4().simple().to_string();
        self.tokens.insert(key.clone(), user_id);
        Ok(key)
    }

    async fn user_by_token(&self, key: &str) -> Result<Option<User>, StoreError> {
        let user_id = match self.tokens.get(key) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }
}
