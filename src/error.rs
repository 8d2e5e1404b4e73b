use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised while encoding a line item into its stored string form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    #[error("name cannot be empty or contain control characters")]
    InvalidName,

    #[error("name {0:?} ends with a bracketed number and would be read back as a price")]
    AmbiguousName(String),

    #[error("unit price must be a non-negative number, got {0}")]
    InvalidPrice(f64),

    #[error("unknown product: {0}")]
    UnknownProduct(i64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("product name cannot be empty")]
    EmptyName,

    #[error("quantity must be greater than 0")]
    InvalidQuantity,

    #[error("purchase cost must be greater than 0")]
    InvalidCost,

    #[error("profit margin must be non-negative")]
    InvalidMargin,

    #[error("minimum order must be at least 1")]
    InvalidMinimumOrder,

    #[error("invalid unit of measure: {0}")]
    InvalidUnit(String),

    #[error("service title cannot be empty")]
    EmptyTitle,

    #[error("a service can hold at most {max} images, got {got}")]
    TooManyImages { max: usize, got: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("unknown product: {0}")]
    UnknownProduct(i64),

    #[error("product {0} is not available")]
    Unavailable(String),

    #[error("{name} requires a minimum order of {minimum}, got {requested}")]
    BelowMinimum {
        name: String,
        minimum: i32,
        requested: i64,
    },

    #[error("a quote needs at least one product")]
    Empty,

    #[error("quantity of {0} is too large")]
    QuantityOverflow(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error surface of the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Codec(_) | ApiError::Catalog(_) | ApiError::Quote(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
