use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::stock::StockShortfall;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Insufficient stock")]
    InsufficientStock(Vec<StockShortfall>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::EmptyCart => AppError::Unprocessable(e.to_string()),
            DomainError::InsufficientStock(shortfalls) => AppError::InsufficientStock(shortfalls),
            DomainError::InvalidStatus(_) | DomainError::InvalidInput(_) => {
                AppError::BadRequest(e.to_string())
            }
            DomainError::IllegalTransition { .. } => AppError::Conflict(e.to_string()),
            DomainError::LockTimeout(msg) => AppError::Unavailable(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound => HttpResponse::NotFound().json(json!({
                "error": self.to_string()
            })),
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(json!({
                "error": self.to_string()
            })),
            AppError::Unprocessable(_) => HttpResponse::UnprocessableEntity().json(json!({
                "error": self.to_string()
            })),
            AppError::InsufficientStock(shortfalls) => {
                let shortfalls: Vec<serde_json::Value> = shortfalls
                    .iter()
                    .map(|s| {
                        json!({
                            "product_id": s.product_id,
                            "product_name": s.product_name,
                            "requested": s.requested,
                            "available": s.available
                        })
                    })
                    .collect();
                HttpResponse::Conflict().json(json!({
                    "error": self.to_string(),
                    "shortfalls": shortfalls
                }))
            }
            AppError::Conflict(_) => HttpResponse::Conflict().json(json!({
                "error": self.to_string()
            })),
            AppError::Unavailable(msg) => {
                log::warn!("Request failed on lock contention: {}", msg);
                HttpResponse::ServiceUnavailable().json(json!({
                    "error": "Resource busy, retry the request"
                }))
            }
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}
