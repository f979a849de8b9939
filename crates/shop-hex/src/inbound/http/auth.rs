use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::application::order_service::OrderService;
use crate::errors::AppError;
use shop_types::domain::user::User;
use shop_types::ports::catalog_store::CatalogStore;
use shop_types::ports::identity_store::IdentityStore;
use shop_types::ports::order_repository::OrderRepository;

/// Authenticated user of the current request, inserted by [`require_token`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Resolves `Authorization: Token <key>` through the identity store before
/// any handler runs. Missing, malformed, or unknown keys end the request
/// with a 401 and no side effects.
pub async fn require_token<S>(
    State(service): State<Arc<OrderService<S>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: OrderRepository + CatalogStore + IdentityStore,
{
    let key = token_key(request.headers()).ok_or(AppError::Unauthorized)?;
    let user = service.authenticate(&key).await?;
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

fn token_key(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let key = header.strip_prefix("Token ")?.trim();
    if key.is_empty() {
        return None;
    }
    Some(key.to_string())
}
