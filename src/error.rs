//! Error handling for the application

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::availability::AvailabilityError;
use crate::booking::BookingError;
use crate::db::StoreError;
use crate::notifications::NotifyError;
use crate::payments::PaymentError;
use crate::pricing::CheckoutError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("Payment provider error: {0}")]
    Upstream(#[from] PaymentError),

    #[error("Database error: {0}")]
    Database(#[from] StoreError),

    #[error("Email delivery error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Notify(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Upstream(e) => {
                tracing::error!("Payment provider error: {}", e);
                "Payment provider error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Notify(e) => {
                tracing::error!("Email delivery error: {}", e);
                "Failed to send message".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<CheckoutError> for AppError {
    fn from(error: CheckoutError) -> Self {
        match error {
            CheckoutError::VehicleNotFound => AppError::NotFound(error.to_string()),
            CheckoutError::Unavailable => AppError::Conflict(error.to_string()),
            CheckoutError::Store(e) => AppError::Database(e),
            CheckoutError::Payment(e) => AppError::Upstream(e),
            CheckoutError::MissingFields
            | CheckoutError::Invalid(_)
            | CheckoutError::TooManyGuests { .. }
            | CheckoutError::Duration(_) => AppError::Validation(error.to_string()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::InvalidEvent(msg) => AppError::Validation(msg),
            BookingError::NotFound => AppError::NotFound(error.to_string()),
            BookingError::NotPending => AppError::Conflict(error.to_string()),
            BookingError::Payment(e) => AppError::Upstream(e),
            BookingError::Store(e) => AppError::Database(e),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(error: AvailabilityError) -> Self {
        match error {
            AvailabilityError::VehicleNotFound => AppError::NotFound(error.to_string()),
            AvailabilityError::Store(e) => AppError::Database(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
