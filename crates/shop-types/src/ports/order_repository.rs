use async_trait::async_trait;

use crate::domain::order::Order;
use crate::ports::StoreError;

#[derive(Debug, Clone)]
pub struct OrderListQuery {
    pub user_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct OrderListing {
    pub orders: Vec<Order>,
    /// Total matching rows before the limit/offset window was applied.
    pub total: i64,
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Persists a new order linking `user_id` to every product in
    /// `product_ids`. Atomic: either the order row and all of its product
    /// links become visible together, or nothing does. Fails with
    /// `UserNotFound` when the user does not exist and `UnknownProducts`
    /// naming exactly the ids that did not resolve.
    async fn create(&self, user_id: i64, product_ids: &[i64]) -> Result<Order, StoreError>;

    /// Orders newest first (creation time descending, id descending as
    /// tiebreak), restartable via `offset`.
    async fn list(&self, query: OrderListQuery) -> Result<OrderListing, StoreError>;
}
