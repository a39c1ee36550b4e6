use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::catalog::ExperienceRepository;
use crate::db::promos::PromoRepository;
use crate::error::ApiError;
use crate::services::notification_service::Notifier;
use crate::services::payment::interface::{CheckoutGateway, CheckoutIntent};
use crate::services::payment::razorpay::RazorpayGateway;
use crate::services::payment::stripe::StripeGateway;
use crate::services::promo_service::PromoService;
use crate::services::quote_service::QuoteService;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub slug: String,
    /// Trip date, `YYYY-MM-DD`.
    pub date: String,
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub promo_code: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validate the request and price the trip. Ordered so that nothing below a
/// failed gate runs: bad input and unknown slugs never reach a provider, and
/// an empty booking is rejected before any session is opened.
async fn build_intent(
    req: &CheckoutRequest,
    catalog: &dyn ExperienceRepository,
    promos: &dyn PromoRepository,
    deposit_rate: f64,
) -> Result<CheckoutIntent, ApiError> {
    let name = req.customer_name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidRequest("customer name is required".into()));
    }

    let email = req.customer_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::InvalidRequest(
            "a valid customer email is required".into(),
        ));
    }

    // Children cannot book alone. An entirely empty party falls through to
    // the quote, which rejects a zero deposit.
    if req.adults == 0 && req.children > 0 {
        return Err(ApiError::InvalidRequest(
            "at least one adult is required".into(),
        ));
    }

    let date = NaiveDate::parse_from_str(req.date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidRequest("date must be formatted YYYY-MM-DD".into()))?;

    let (kind, experience) = catalog
        .find_by_slug(req.slug.trim())
        .await?
        .ok_or(ApiError::NotFound("experience"))?;

    // An unknown or inactive code is not an error: checkout proceeds at full
    // price rather than blocking on a typo.
    let promo = match &req.promo_code {
        Some(code) if !code.trim().is_empty() => promos
            .find_code(&PromoService::normalize_code(code))
            .await?
            .filter(|p| p.active),
        _ => None,
    };

    let quote = QuoteService::build(
        experience.price_per_person,
        req.adults,
        req.children,
        promo.as_ref(),
        deposit_rate,
    )?;

    Ok(CheckoutIntent {
        kind,
        slug: experience.slug,
        title: experience.title,
        date,
        adults: req.adults,
        children: req.children,
        quote,
        promo_code: promo.map(|p| p.code),
        customer_name: name.to_string(),
        customer_email: email.to_string(),
        customer_phone: req.customer_phone.clone().filter(|p| !p.trim().is_empty()),
        notes: req.notes.clone().filter(|n| !n.trim().is_empty()),
    })
}

// Best effort: a failed email must never fail checkout.
fn notify_request(notifier: Arc<dyn Notifier>, intent: &CheckoutIntent) {
    let email = intent.customer_email.clone();
    let name = intent.customer_name.clone();
    let title = intent.title.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier.booking_request_received(&email, &name, &title).await {
            log::warn!("booking request notification failed: {}", e);
        }
    });
}

/// `POST /api/checkout/session`: open a hosted Stripe Checkout session for
/// the deposit and hand back its redirect URL.
pub async fn create_stripe_session(
    gateway: web::Data<Arc<StripeGateway>>,
    catalog: web::Data<Arc<dyn ExperienceRepository>>,
    promos: web::Data<Arc<dyn PromoRepository>>,
    notifier: web::Data<Arc<dyn Notifier>>,
    input: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    let intent = build_intent(
        &input,
        catalog.get_ref().as_ref(),
        promos.get_ref().as_ref(),
        gateway.deposit_rate(),
    )
    .await?;

    if !gateway.is_configured() {
        return Err(ApiError::ProviderUnavailable);
    }

    let session = gateway.open_session(&intent).await?;
    log::info!(
        "stripe checkout session {} opened for {} ({:.2} USD deposit)",
        session.provider_session_id,
        intent.slug,
        intent.quote.deposit_amount
    );

    notify_request(notifier.get_ref().clone(), &intent);

    Ok(HttpResponse::Ok().json(json!({
        "redirect_url": session.redirect_url,
        "session_id": session.provider_session_id,
    })))
}

/// `POST /api/checkout/order`: create a Razorpay order for the deposit. The
/// client completes payment in the embedded checkout and then calls
/// `/api/checkout/confirm`.
pub async fn create_razorpay_order(
    gateway: web::Data<Arc<RazorpayGateway>>,
    catalog: web::Data<Arc<dyn ExperienceRepository>>,
    promos: web::Data<Arc<dyn PromoRepository>>,
    notifier: web::Data<Arc<dyn Notifier>>,
    input: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    let intent = build_intent(
        &input,
        catalog.get_ref().as_ref(),
        promos.get_ref().as_ref(),
        gateway.deposit_rate(),
    )
    .await?;

    if !gateway.is_configured() {
        return Err(ApiError::ProviderUnavailable);
    }

    let session = gateway.open_session(&intent).await?;
    log::info!(
        "razorpay order {} opened for {} ({:.2} USD deposit)",
        session.provider_session_id,
        intent.slug,
        intent.quote.deposit_amount
    );

    notify_request(notifier.get_ref().clone(), &intent);

    Ok(HttpResponse::Ok().json(json!({
        "order_id": session.provider_session_id,
        "key_id": gateway.key_id(),
        "amount": intent.quote.deposit_minor_units(),
        "currency": intent.quote.currency,
    })))
}
