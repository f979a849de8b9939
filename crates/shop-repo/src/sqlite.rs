use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shop_types::domain::catalog::{Category, Product};
use shop_types::domain::order::Order;
use shop_types::domain::user::User;
use shop_types::ports::catalog_store::CatalogStore;
use shop_types::ports::identity_store::IdentityStore;
use shop_types::ports::order_repository::{OrderListQuery, OrderListing, OrderRepository};
use shop_types::ports::StoreError;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Executor, FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Db(e.to_string())
}

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    created_at: String,
}

impl OrderRow {
    fn into_order(self, product_ids: Vec<i64>) -> Result<Order, StoreError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(db_err)?
            .with_timezone(&Utc);
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            product_ids,
            created_at,
        })
    }
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file.
        let ddl = include_str!("../migrations/0001_create_shop.sql");
        pool.execute(ddl).await?;

        Ok(Self { pool })
    }

    async fn product_ids_for(&self, order_id: i64) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT product_id FROM order_lines WHERE order_id = ? ORDER BY rowid")
                .bind(order_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl OrderRepository for SqliteStore {
    async fn create(&self, user_id: i64, product_ids: &[i64]) -> Result<Order, StoreError> {
        let product_ids = Order::normalize_product_ids(product_ids);
        if product_ids.is_empty() {
            return Err(StoreError::EmptyProducts);
        }

        // Validation reads and the order/line inserts share one transaction;
        // any early return drops it, rolling everything back.
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let user: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if user.is_none() {
            return Err(StoreError::UserNotFound(user_id));
        }

        let mut missing = Vec::new();
        for id in &product_ids {
            let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = ?")
                .bind(*id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
            if found.is_none() {
                missing.push(*id);
            }
        }
        if !missing.is_empty() {
            return Err(StoreError::UnknownProducts(missing));
        }

        let created_at = Utc::now();
        let res = sqlx::query("INSERT INTO orders (user_id, created_at) VALUES (?, ?)")
            .bind(user_id)
            .bind(created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let order_id = res.last_insert_rowid();

        for id in &product_ids {
            sqlx::query("INSERT INTO order_lines (order_id, product_id) VALUES (?, ?)")
                .bind(order_id)
                .bind(*id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        Ok(Order {
            id: order_id,
            user_id,
            product_ids,
            created_at,
        })
    }

    async fn list(&self, query: OrderListQuery) -> Result<OrderListing, StoreError> {
        let (rows, total): (Vec<OrderRow>, i64) = match query.user_id {
            Some(user_id) => {
                let rows = sqlx::query_as(
                    "SELECT id, user_id, created_at FROM orders WHERE user_id = ? \
                     ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                )
                .bind(user_id)
                .bind(query.limit)
                .bind(query.offset)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
                let total = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_err)?;
                (rows, total)
            }
            None => {
                let rows = sqlx::query_as(
                    "SELECT id, user_id, created_at FROM orders \
                     ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                )
                .bind(query.limit)
                .bind(query.offset)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
                let total = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_err)?;
                (rows, total)
            }
        };

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let product_ids = self.product_ids_for(row.id).await?;
            orders.push(row.into_order(product_ids)?);
        }
        Ok(OrderListing { orders, total })
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn add_category(&self, title: &str) -> Result<Category, StoreError> {
        let res = sqlx::query("INSERT INTO categories (title) VALUES (?)")
            .bind(title)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Category {
            id: res.last_insert_rowid(),
            title: title.to_string(),
        })
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

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let mut missing = Vec::new();
        for id in &unique {
            let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = ?")
                .bind(*id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
            if found.is_none() {
                missing.push(*id);
            }
        }
        if !missing.is_empty() {
            return Err(StoreError::UnknownCategories(missing));
        }

        let res = sqlx::query("INSERT INTO products (title, price) VALUES (?, ?)")
            .bind(title)
            .bind(price)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let product_id = res.last_insert_rowid();

        for id in &unique {
            sqlx::query("INSERT INTO product_categories (product_id, category_id) VALUES (?, ?)")
                .bind(product_id)
                .bind(*id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        Ok(Product {
            id: product_id,
            title: title.to_string(),
            price,
            category_ids: unique,
        })
    }

    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, StoreError> {
        let mut products = Vec::new();
        for id in ids {
            let row: Option<(i64, String, i64)> =
                sqlx::query_as("SELECT id, title, price FROM products WHERE id = ?")
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_err)?;
            if let Some((id, title, price)) = row {
                let cats: Vec<(i64,)> = sqlx::query_as(
                    "SELECT category_id FROM product_categories \
                     WHERE product_id = ? ORDER BY rowid",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
                products.push(Product {
                    id,
                    title,
                    price,
                    category_ids: cats.into_iter().map(|(c,)| c).collect(),
                });
            }
        }
        Ok(products)
    }

    async fn categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, StoreError> {
        let mut categories = Vec::new();
        for id in ids {
            let row: Option<(i64, String)> =
                sqlx::query_as("SELECT id, title FROM categories WHERE id = ?")
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_err)?;
            if let Some((id, title)) = row {
                categories.push(Category { id, title });
            }
        }
        Ok(categories)
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn add_user(&self, username: &str, email: &str) -> Result<User, StoreError> {
        let res = sqlx::query("INSERT INTO users (username, email) VALUES (?, ?)")
            .bind(username)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(User {
            id: res.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    async fn issue_token(&self, user_id: i64) -> Result<String, StoreError> {
        let key = Uuid::new_v4().simple().to_string();

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let user: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if user.is_none() {
            return Err(StoreError::UserNotFound(user_id));
        }

        // One live key per user.
        sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES (?, ?)")
            .bind(&key)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(key)
    }

    async fn user_by_token(&self, key: &str) -> Result<Option<User>, StoreError> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT u.id, u.username, u.email FROM auth_tokens t \
             JOIN users u ON u.id = t.user_id WHERE t.key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(|(id, username, email)| User {
            id,
            username,
            email,
        }))
    }
}
