use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::db::StoreError;
use crate::services::payment::interface::GatewayError;
use crate::services::quote_service::QuoteError;

/// Shown whenever the payment provider is the thing that failed: the booking
/// is recoverable manually and must never look silently lost.
const CONTACT_FALLBACK: &str =
    "Your card has not been charged. Please contact bookings@trailhead.travel and we will arrange your booking manually.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("booking amount must be greater than zero")]
    EmptyBooking,
    #[error("payment provider is not configured")]
    ProviderUnavailable,
    #[error("payment provider request failed: {0}")]
    ProviderError(String),
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("failed to persist booking: {0}")]
    Persistence(String),
}

impl ApiError {
    fn user_message(&self) -> String {
        match self {
            ApiError::ProviderUnavailable | ApiError::ProviderError(_) => {
                format!("{}. {}", self, CONTACT_FALLBACK)
            }
            _ => self.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::EmptyBooking | ApiError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ProviderError(_) | ApiError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.user_message() }))
    }
}

impl From<QuoteError> for ApiError {
    fn from(_: QuoteError) -> Self {
        ApiError::EmptyBooking
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Persistence(e.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotConfigured => ApiError::ProviderUnavailable,
            GatewayError::Provider(message) => ApiError::ProviderError(message),
        }
    }
}
