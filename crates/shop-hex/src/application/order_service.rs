use crate::errors::AppError;
use shop_types::domain::catalog::Product;
use shop_types::domain::order::{CategoryView, Order, OrderView, ProductView};
use shop_types::domain::user::User;
use shop_types::ports::catalog_store::CatalogStore;
use shop_types::ports::identity_store::IdentityStore;
use shop_types::ports::order_repository::{OrderListQuery, OrderRepository};

/// Listing window requested by the caller. `user_id` narrows the listing to
/// one owner; `limit`/`offset` select the page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub user_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub results: Vec<OrderView>,
    /// Total matching orders, not the size of this page.
    pub count: i64,
}

pub struct OrderService<S> {
    store: S,
}

impl<S> OrderService<S>
where
    S: OrderRepository + CatalogStore + IdentityStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves a bearer token key to its user. Unknown keys are a 401.
    pub async fn authenticate(&self, key: &str) -> Result<User, AppError> {
        match self.store.user_by_token(key).await? {
            Some(user) => Ok(user),
            None => Err(AppError::Unauthorized),
        }
    }

    /// Creates one order for `owner` linking every product in `products_id`.
    /// The payload may only name the authenticated user as owner. Exactly one
    /// repository create; validation failures never retry.
    pub async fn create_order(
        &self,
        requesting_user: &User,
        owner: i64,
        products_id: Vec<i64>,
    ) -> Result<OrderView, AppError> {
        if owner != requesting_user.id {
            return Err(AppError::Forbidden);
        }
        if products_id.is_empty() {
            return Err(AppError::validation(
                "products_id",
                "must contain at least one product id",
            ));
        }
        let order = self.store.create(owner, &products_id).await?;
        tracing::info!(
            order_id = order.id,
            user_id = owner,
            products = order.product_ids.len(),
            "order created"
        );
        self.expand(&order).await
    }

    pub async fn list_orders(&self, page: PageRequest) -> Result<OrderPage, AppError> {
        if page.limit <= 0 {
            return Err(AppError::validation("limit", "must be a positive integer"));
        }
        if page.offset < 0 {
            return Err(AppError::validation("offset", "must not be negative"));
        }
        let listing = self
            .store
            .list(OrderListQuery {
                user_id: page.user_id,
                limit: page.limit,
                offset: page.offset,
            })
            .await?;
        tracing::debug!(
            returned = listing.orders.len(),
            total = listing.total,
            "orders listed"
        );

        let mut results = Vec::with_capacity(listing.orders.len());
        for order in &listing.orders {
            results.push(self.expand(order).await?);
        }
        Ok(OrderPage {
            results,
            count: listing.total,
        })
    }

    /// Expands an order into its API shape: products resolved from the
    /// catalog at read time, each carrying its category titles.
    async fn expand(&self, order: &Order) -> Result<OrderView, AppError> {
        let products = self.store.products_by_ids(&order.product_ids).await?;
        let mut views = Vec::with_capacity(products.len());
        for product in products {
            views.push(self.expand_product(product).await?);
        }
        Ok(OrderView {
            id: order.id,
            user: order.user_id,
            product: views,
        })
    }

    async fn expand_product(&self, product: Product) -> Result<ProductView, AppError> {
        let categories = self.store.categories_by_ids(&product.category_ids).await?;
        Ok(ProductView {
            id: product.id,
            title: product.title,
            price: product.price,
            category: categories.iter().map(CategoryView::from).collect(),
        })
    }
}
