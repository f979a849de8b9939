use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    middleware,
    routing::get,
    serve, Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::order_service::{OrderService, PageRequest};
use crate::errors::AppError;
use crate::inbound::http::auth::{self, CurrentUser};
use shop_types::domain::order::OrderView;
use shop_types::ports::catalog_store::CatalogStore;
use shop_types::ports::identity_store::IdentityStore;
use shop_types::ports::order_repository::OrderRepository;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    /// Orders per listing page when the request carries no `limit`.
    pub page_size: i64,
}

#[derive(Clone)]
pub struct HttpServer<S>
where
    S: OrderRepository + CatalogStore + IdentityStore,
{
    pub service: Arc<OrderService<S>>,
    pub config: HttpServerConfig,
}

struct AppState<S> {
    service: Arc<OrderService<S>>,
    page_size: i64,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            page_size: self.page_size,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub products_id: Vec<i64>,
    pub user: i64,
}

#[derive(Deserialize)]
pub struct ListOrdersParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub user: Option<i64>,
}

#[derive(Serialize)]
pub struct ListOrdersResponse {
    pub results: Vec<OrderView>,
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl<S> HttpServer<S>
where
    S: OrderRepository + CatalogStore + IdentityStore + Send + Sync + 'static,
{
    pub async fn new(service: OrderService<S>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            service: Arc::new(service),
            config,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let state = AppState {
            service: self.service.clone(),
            page_size: self.config.page_size,
        };

        // Every order route sits behind the token check; /health stays open.
        let orders = Router::new()
            .route("/orders", get(list_orders::<S>).post(create_order::<S>))
            .route_layer(middleware::from_fn_with_state(
                state.service.clone(),
                auth::require_token::<S>,
            ));

        let app = Router::new()
            .route("/health", get(health))
            .nest("/v1", orders)
            .layer(trace_layer)
            .layer(CorsLayer::permissive())
            .with_state(state);

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn create_order<S>(
    State(state): State<AppState<S>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<OrderView>), AppError>
where
    S: OrderRepository + CatalogStore + IdentityStore,
{
    let Json(payload) = payload.map_err(|e| AppError::validation("body", e.body_text()))?;
    let view = state
        .service
        .create_order(&user, payload.user, payload.products_id)
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(view)))
}

async fn list_orders<S>(
    State(state): State<AppState<S>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<ListOrdersResponse>, AppError>
where
    S: OrderRepository + CatalogStore + IdentityStore,
{
    let Query(params) = params.map_err(|e| AppError::validation("query", e.body_text()))?;
    let limit = params.limit.unwrap_or(state.page_size);
    let offset = params.offset.unwrap_or(0);
    let page = state
        .service
        .list_orders(PageRequest {
            user_id: params.user,
            limit,
            offset,
        })
        .await?;

    // Saturate so an extreme window cannot wrap; a saturated sum never
    // undercuts `count`, so it simply yields no next page.
    let next_offset = offset.saturating_add(limit);
    let next = if next_offset < page.count {
        Some(page_link(limit, next_offset, params.user))
    } else {
        None
    };
    let previous = if offset > 0 {
        Some(page_link(limit, (offset - limit).max(0), params.user))
    } else {
        None
    };

    Ok(Json(ListOrdersResponse {
        results: page.results,
        count: page.count,
        next,
        previous,
    }))
}

fn page_link(limit: i64, offset: i64, user: Option<i64>) -> String {
    match user {
        Some(user) => format!("/v1/orders?limit={limit}&offset={offset}&user={user}"),
        None => format!("/v1/orders?limit={limit}&offset={offset}"),
    }
}
