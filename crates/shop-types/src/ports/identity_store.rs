use async_trait::async_trait;

use crate::domain::user::User;
use crate::ports::StoreError;

/// System of record for users and their bearer credentials.
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    async fn add_user(&self, username: &str, email: &str) -> Result<User, StoreError>;

    /// Issues a fresh token key for the user. Keys map 1:1 to users: any
    /// previously issued key for `user_id` stops resolving.
    async fn issue_token(&self, user_id: i64) -> Result<String, StoreError>;

    /// Resolves a bearer token key to its user, if the key is known.
    async fn user_by_token(&self, key: &str) -> Result<Option<User>, StoreError>;
}
