#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a store feature: `memory` or `sqlite`.");

use shop_types::domain::catalog::{Category, Product};
use shop_types::domain::order::Order;
use shop_types::domain::user::User;
use shop_types::ports::catalog_store::CatalogStore;
use shop_types::ports::identity_store::IdentityStore;
use shop_types::ports::order_repository::{OrderListQuery, OrderListing, OrderRepository};
use shop_types::ports::StoreError;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Feature-selected store facade. One value backs all three ports so the
/// order repository validates references against the same data the catalog
/// and identity stores serve.
#[derive(Clone)]
pub struct Store {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteStore),
}

pub async fn build_store(url: Option<&str>) -> anyhow::Result<Store> {
    Store::build(url).await
}

impl Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            inner: Inner::Memory(memory::InMemoryStore::new()),
        })
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://shop.db");
        let sqlite = sqlite::SqliteStore::new(url).await?;
        Ok(Self {
            inner: Inner::Sqlite(sqlite),
        })
    }

    // If both features are enabled, the database url decides.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Self {
                inner: Inner::Sqlite(sqlite::SqliteStore::new(url).await?),
            }),
            None => Ok(Self {
                inner: Inner::Memory(memory::InMemoryStore::new()),
            }),
        }
    }
}

#[async_trait::async_trait]
impl OrderRepository for Store {
    async fn create(&self, user_id: i64, product_ids: &[i64]) -> Result<Order, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.create(user_id, product_ids).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.create(user_id, product_ids).await,
        }
    }

    async fn list(&self, query: OrderListQuery) -> Result<OrderListing, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.list(query).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.list(query).await,
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for Store {
    async fn add_category(&self, title: &str) -> Result<Category, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.add_category(title).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.add_category(title).await,
        }
    }

    async fn add_product(
        &self,
        title: &str,
        price: i64,
        category_ids: &[i64],
    ) -> Result<Product, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.add_product(title, price, category_ids).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.add_product(title, price, category_ids).await,
        }
    }

    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.products_by_ids(ids).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.products_by_ids(ids).await,
        }
    }

    async fn categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.categories_by_ids(ids).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.categories_by_ids(ids).await,
        }
    }
}

#[async_trait::async_trait]
impl IdentityStore for Store {
    async fn add_user(&self, username: &str, email: &str) -> Result<User, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.add_user(username, email).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.add_user(username, email).await,
        }
    }

    async fn issue_token(&self, user_id: i64) -> Result<String, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.issue_token(user_id).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.issue_token(user_id).await,
        }
    }

    async fn user_by_token(&self, key: &str) -> Result<Option<User>, StoreError> {
        match &self.inner {
            #[cfg(feature = "memory")]
            Inner::Memory(s) => s.user_by_token(key).await,
            #[cfg(feature = "sqlite")]
            Inner::Sqlite(s) => s.user_by_token(key).await,
        }
    }
}
