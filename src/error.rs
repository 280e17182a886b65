use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure a request can end in. Each variant maps to exactly one
/// HTTP status and one machine-readable `kind`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure")]
    Persistence(#[source] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::Conflict(_) => "CONFLICT",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } | Self::ProductNotFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientStock { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        match self {
            Self::ProductNotFound(product_id) => {
                body["productId"] = json!(product_id);
            }
            Self::InsufficientStock {
                product_id,
                requested,
                available,
            } => {
                body["productId"] = json!(product_id);
                body["requested"] = json!(requested);
                body["available"] = json!(available);
            }
            _ => {}
        }
        json!({ "error": body })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Persistence(e.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Persistence(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Persistence(cause) = &self {
            error!(error = ?cause, "request failed in storage layer");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

/// Name of the unique constraint a database error violated, if that is what it was.
pub fn unique_violation(e: &sqlx::Error) -> Option<&str> {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Some(db.constraint().unwrap_or("")),
        _ => None,
    }
}
