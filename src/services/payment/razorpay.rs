use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;

use super::interface::{CheckoutGateway, CheckoutIntent, GatewayError, HostedSession};
use crate::config::RazorpayConfig;

pub const SOURCE: &str = "razorpay";

/// Razorpay Orders API client. Orders carry the booking metadata as `notes`,
/// so a paid order is self-describing the same way a Stripe session is.
#[derive(Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    config: RazorpayConfig,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    /// Deposit in minor units (cents).
    amount: i64,
    currency: &'a str,
    receipt: String,
    notes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub amount_paid: i64,
    pub currency: String,
    /// "created", "attempted" or "paid".
    pub status: String,
    #[serde(default)]
    pub notes: Option<serde_json::Value>,
}

impl RazorpayOrder {
    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }

    /// Razorpay serializes empty notes as `[]`, so the field is kept loose
    /// and flattened here.
    pub fn notes_map(&self) -> HashMap<String, String> {
        match &self.notes {
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
            _ => HashMap::new(),
        }
    }

    /// Amount actually captured, in USD. `None` until a payment lands.
    pub fn amount_paid_usd(&self) -> Option<f64> {
        (self.amount_paid > 0).then(|| self.amount_paid as f64 / 100.0)
    }
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    pub async fn fetch_order(&self, order_id: &str) -> Result<RazorpayOrder, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let url = format!("{}/orders/{}", self.config.api_base_url, order_id);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await
            .map_err(|e| GatewayError::Provider(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Provider(e.to_string()))?;

        if !status.is_success() {
            log::error!("razorpay order fetch failed ({}): {}", status, body);
            return Err(GatewayError::Provider(format!(
                "order fetch failed with status {}",
                status
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| GatewayError::Provider(format!("unexpected order payload: {}", e)))
    }

    /// Razorpay signs the checkout callback as
    /// `hex(hmac_sha256(key_secret, "{order_id}|{payment_id}"))`.
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(self.config.key_secret.as_bytes())
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes()) == signature
    }
}

#[async_trait::async_trait]
impl CheckoutGateway for RazorpayGateway {
    fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.is_empty()
    }

    fn deposit_rate(&self) -> f64 {
        self.config.deposit_rate
    }

    async fn open_session(&self, intent: &CheckoutIntent) -> Result<HostedSession, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let request = CreateOrderRequest {
            amount: intent.quote.deposit_minor_units(),
            currency: &intent.quote.currency,
            receipt: format!("thd_{}", uuid::Uuid::new_v4().simple()),
            notes: intent.metadata(),
        };

        let url = format!("{}/orders", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Provider(e.to_string()))?;

        if !status.is_success() {
            log::error!("razorpay order creation failed ({}): {}", status, body);
            return Err(GatewayError::Provider(format!(
                "order creation failed with status {}",
                status
            )));
        }

        let order: RazorpayOrder = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Provider(format!("unexpected order payload: {}", e)))?;
        log::info!(
            "razorpay order {} created for {} ({} cents)",
            order.id,
            intent.slug,
            order.amount
        );

        Ok(HostedSession {
            provider_session_id: order.id,
            redirect_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(key_id: &str, key_secret: &str) -> RazorpayGateway {
        RazorpayGateway::new(RazorpayConfig {
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            api_base_url: "https://api.razorpay.com/v1".to_string(),
            deposit_rate: 0.2,
        })
    }

    #[test]
    fn test_is_configured() {
        assert!(gateway("rzp_test_123", "secret").is_configured());
        assert!(!gateway("", "").is_configured());
        assert!(!gateway("rzp_test_123", "").is_configured());
    }

    #[test]
    fn test_payment_signature_round_trip() {
        let gw = gateway("rzp_test_123", "my_secret_key");

        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(b"my_secret_key").unwrap();
        mac.update(b"order_123|pay_456");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert!(gw.verify_payment_signature("order_123", "pay_456", &expected));
        assert!(!gw.verify_payment_signature("order_123", "pay_456", "bogus"));
    }

    #[test]
    fn test_notes_flattening() {
        let order: RazorpayOrder = serde_json::from_str(
            r#"{"id":"order_1","amount":5000,"amount_paid":5000,"currency":"USD","status":"paid","notes":{"experience_slug":"highland-circuit","adults":"2"}}"#,
        )
        .unwrap();
        assert!(order.is_paid());
        assert_eq!(order.amount_paid_usd(), Some(50.0));
        assert_eq!(
            order.notes_map().get("experience_slug").map(String::as_str),
            Some("highland-circuit")
        );

        let empty: RazorpayOrder = serde_json::from_str(
            r#"{"id":"order_2","amount":5000,"amount_paid":0,"currency":"USD","status":"created","notes":[]}"#,
        )
        .unwrap();
        assert!(empty.notes_map().is_empty());
        assert_eq!(empty.amount_paid_usd(), None);
    }
}
