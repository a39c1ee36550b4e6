use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use stripe::{
    CheckoutSession, CheckoutSessionMode, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    Currency,
};

use super::interface::{CheckoutGateway, CheckoutIntent, GatewayError, HostedSession};
use crate::config::StripeConfig;

pub const SOURCE: &str = "stripe";

/// The only inbound event type that creates a booking.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Hosted Stripe Checkout flow. The client is constructed here and injected
/// into handlers, so tests can wire a gateway without touching process
/// environment.
pub struct StripeGateway {
    client: stripe::Client,
    config: StripeConfig,
    base_url: String,
}

impl StripeGateway {
    pub fn new(config: StripeConfig, base_url: String) -> Self {
        Self {
            client: stripe::Client::new(config.secret_key.clone()),
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }
}

#[async_trait::async_trait]
impl CheckoutGateway for StripeGateway {
    fn is_configured(&self) -> bool {
        !self.config.secret_key.is_empty()
    }

    fn deposit_rate(&self) -> f64 {
        self.config.deposit_rate
    }

    async fn open_session(&self, intent: &CheckoutIntent) -> Result<HostedSession, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let success_url = format!(
            "{}/booking/confirmed?session_id={{CHECKOUT_SESSION_ID}}",
            self.base_url
        );
        let cancel_url = format!("{}/{}s/{}", self.base_url, intent.kind, intent.slug);
        let description = format!(
            "{} on {} for {} adult(s), {} child(ren). Total ${:.2}, deposit ${:.2}, balance on arrival.",
            intent.title,
            intent.date,
            intent.adults,
            intent.children,
            intent.quote.final_total,
            intent.quote.deposit_amount,
        );

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.success_url = Some(&success_url);
        params.cancel_url = Some(&cancel_url);
        params.customer_email = Some(&intent.customer_email);
        params.metadata = Some(intent.metadata());
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::USD,
                unit_amount: Some(intent.quote.deposit_minor_units()),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: format!("{} (deposit)", intent.title),
                    description: Some(description),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| GatewayError::Provider(e.to_string()))?;

        Ok(HostedSession {
            provider_session_id: session.id.to_string(),
            redirect_url: session.url,
        })
    }
}

/// The subset of a Stripe event the webhook handler needs. Parsed leniently
/// so unrecognized event types can be acknowledged instead of rejected.
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,
}

#[derive(Debug, Deserialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("malformed stripe-signature header")]
    BadHeader,
    #[error("signature mismatch")]
    Mismatch,
    #[error("timestamp outside tolerance")]
    Expired,
}

/// Verify a `Stripe-Signature` header (`t=...,v1=...`) against the raw body,
/// per Stripe's v1 scheme: `v1 = hex(hmac_sha256(secret, "{t}.{body}"))`.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::BadHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::BadHeader);
    }
    if (chrono::Utc::now().timestamp() - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    let expected = sign_payload(payload, timestamp, secret);
    if candidates.iter().any(|c| *c == expected) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// The v1 signature for a timestamped payload. Public so tests can forge
/// valid deliveries.
pub fn sign_payload(payload: &str, timestamp: i64, secret: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
