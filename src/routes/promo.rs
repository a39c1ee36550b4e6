use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::promos::PromoRepository;
use crate::error::ApiError;
use crate::models::quote::round_usd;
use crate::services::promo_service::PromoService;

#[derive(Debug, Deserialize)]
pub struct PromoValidationRequest {
    pub code: String,
    /// The subtotal the discount previews against.
    pub amount: f64,
}

/// `POST /api/promos/validate`: pre-checkout discount preview. Runs the exact
/// resolver math checkout runs, so the displayed and charged discounts can
/// never diverge.
pub async fn validate_promo(
    promos: web::Data<Arc<dyn PromoRepository>>,
    input: web::Json<PromoValidationRequest>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    let base = input.amount.max(0.0);

    let promo = promos
        .find_code(&PromoService::normalize_code(&input.code))
        .await?;

    match promo.filter(|p| p.active) {
        Some(promo) => {
            let discount = round_usd(PromoService::discount_for(&promo, base));
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "code": promo.code,
                "discount_amount": discount,
                "final_total": round_usd(base - discount),
            })))
        }
        None => Ok(HttpResponse::Ok().json(json!({
            "success": false,
            "error": "Invalid or inactive promo code",
        }))),
    }
}
