use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shop_types::ports::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("validation failed on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmptyProducts => {
                AppError::validation("products_id", "must contain at least one product id")
            }
            StoreError::UnknownProducts(ids) => {
                AppError::validation("products_id", format!("unknown product ids: {ids:?}"))
            }
            StoreError::UnknownCategories(ids) => {
                AppError::validation("category_ids", format!("unknown category ids: {ids:?}"))
            }
            StoreError::UserNotFound(id) => AppError::NotFound(format!("user {id}")),
            StoreError::NegativePrice => AppError::validation("price", "must not be negative"),
            StoreError::Conflict(m) => AppError::Conflict(m),
            StoreError::Db(m) => AppError::Internal(anyhow::anyhow!(m)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, field, msg) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, None, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, None, self.to_string()),
            AppError::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, Some(field.clone()), message.clone())
            }
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, None, m.clone()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, None, m.clone()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None, "internal error".into()),
        };

        let body = serde_json::to_string(&ErrorBody { error: msg, field })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
