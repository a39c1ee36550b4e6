use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::db::ledger::BookingLedger;
use crate::error::ApiError;
use crate::models::booking::BookingPatch;

/// `GET /api/bookings`: the full ledger, for the operator dashboard.
pub async fn list_bookings(
    ledger: web::Data<Arc<dyn BookingLedger>>,
) -> Result<HttpResponse, ApiError> {
    let records = ledger.read_all().await?;
    Ok(HttpResponse::Ok().json(records))
}

/// `GET /api/bookings/{id}`: a single booking by its ledger id.
pub async fn get_booking(
    ledger: web::Data<Arc<dyn BookingLedger>>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    match ledger.find_by_id(&id).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Err(ApiError::NotFound("booking")),
    }
}

/// `PATCH /api/bookings/{id}`: operator adjustments. Only status, payment
/// status and notes are patchable; the financial fields are immutable once a
/// booking is ledgered.
pub async fn patch_booking(
    ledger: web::Data<Arc<dyn BookingLedger>>,
    id: web::Path<String>,
    patch: web::Json<BookingPatch>,
) -> Result<HttpResponse, ApiError> {
    match ledger.update_by_id(&id, patch.into_inner()).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Err(ApiError::NotFound("booking")),
    }
}
