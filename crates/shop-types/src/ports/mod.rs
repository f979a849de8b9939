pub mod catalog_store;
pub mod identity_store;
pub mod order_repository;

/// Errors surfaced by the stores. Validation variants carry the offending
/// ids so callers can report them.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("order must contain at least one product")]
    EmptyProducts,
    #[error("unknown product ids: {0:?}")]
    UnknownProducts(Vec<i64>),
    #[error("unknown category ids: {0:?}")]
    UnknownCategories(Vec<i64>),
    #[error("user {0} not found")]
    UserNotFound(i64),
    #[error("product price must not be negative")]
    NegativePrice,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("db error: {0}")]
    Db(String),
}
