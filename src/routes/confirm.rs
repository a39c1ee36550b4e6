use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::ledger::{AppendOutcome, BookingLedger};
use crate::error::ApiError;
use crate::services::notification_service::Notifier;
use crate::services::payment::interface::{CheckoutGateway, SessionMetadata};
use crate::services::payment::razorpay::{self, RazorpayGateway};

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    /// The Razorpay order id returned by `/api/checkout/order`. No booking
    /// row exists before payment, so this is the only shared reference.
    pub booking_id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// `POST /api/checkout/confirm`: called by the client after it returns from
/// the Razorpay checkout. Safe to call any number of times, from any number
/// of tabs: the first call writes the booking, every later call reports
/// `already_processed` without re-running side effects.
pub async fn confirm_booking(
    gateway: web::Data<Arc<RazorpayGateway>>,
    ledger: web::Data<Arc<dyn BookingLedger>>,
    notifier: web::Data<Arc<dyn Notifier>>,
    input: web::Json<ConfirmRequest>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    let order_id = input.booking_id.trim().to_string();
    if order_id.is_empty() {
        return Err(ApiError::InvalidRequest("booking_id is required".into()));
    }

    if let Some(existing) = ledger.find_by_session(&order_id).await? {
        log::info!(
            "confirmation replay for order {}; booking {} already recorded",
            order_id,
            existing.id
        );
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "already_processed": true,
            "booking_id": existing.id,
        })));
    }

    // Configuration first: without a key secret there is nothing meaningful
    // to verify a callback signature against.
    if !gateway.is_configured() {
        return Err(ApiError::ProviderUnavailable);
    }

    // When the checkout callback params are present, check them locally
    // before spending a provider round trip.
    if let (Some(payment_id), Some(signature)) = (&input.payment_id, &input.signature) {
        if !gateway.verify_payment_signature(&order_id, payment_id, signature) {
            return Err(ApiError::InvalidSignature);
        }
    }

    let order = gateway.fetch_order(&order_id).await?;
    if !order.is_paid() {
        return Err(ApiError::ProviderError(format!(
            "order {} is not paid yet (status: {})",
            order.id, order.status
        )));
    }

    let notes = order.notes_map();
    let meta = SessionMetadata::from_map(&notes).ok_or_else(|| {
        ApiError::ProviderError(format!(
            "order {} carries no reconstructable booking metadata",
            order.id
        ))
    })?;
    let email = meta.customer_email.clone().ok_or_else(|| {
        ApiError::ProviderError(format!("order {} carries no customer email", order.id))
    })?;

    let record = meta.into_booking(&order.id, email, order.amount_paid_usd(), razorpay::SOURCE);

    match ledger.append_if_absent(record.clone()).await {
        Ok(AppendOutcome::Inserted) => {
            log::info!(
                "booking {} written for razorpay order {}",
                record.id,
                record.session_id
            );
            let confirmed = record.clone();
            let notifier = notifier.get_ref().clone();
            tokio::spawn(async move {
                if let Err(e) = notifier.booking_confirmed(&confirmed).await {
                    log::warn!("booking confirmation notification failed: {}", e);
                }
            });

            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "already_processed": false,
                "booking_id": record.id,
            })))
        }
        Ok(AppendOutcome::DuplicateSession) => {
            // Lost the race against another tab or the webhook; the booking
            // exists either way.
            let existing = ledger.find_by_session(&record.session_id).await?;
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "already_processed": true,
                "booking_id": existing.map(|b| b.id),
            })))
        }
        // Unlike the webhook path, the client can safely retry this.
        Err(e) => Err(ApiError::Persistence(e.to_string())),
    }
}
