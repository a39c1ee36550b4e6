use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::models::booking::{BookingRecord, BookingStatus};
use crate::models::experience::ExperienceKind;
use crate::models::quote::{round_usd, Quote};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Credentials absent; the flow cannot be offered at all.
    #[error("payment provider is not configured")]
    NotConfigured,
    #[error("payment provider call failed: {0}")]
    Provider(String),
}

/// A guest's fully priced intent to book, as handed to a payment provider.
#[derive(Debug, Clone)]
pub struct CheckoutIntent {
    pub kind: ExperienceKind,
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub quote: Quote,
    /// The code actually applied, post-resolution.
    pub promo_code: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutIntent {
    /// Flatten the intent into provider session metadata. The session is the
    /// only record of the purchase until payment completes, so everything a
    /// booking needs must be present here. No pending row is written.
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("experience_type".to_string(), self.kind.to_string());
        map.insert("experience_slug".to_string(), self.slug.clone());
        map.insert("experience_title".to_string(), self.title.clone());
        map.insert("date".to_string(), self.date.to_string());
        map.insert("adults".to_string(), self.adults.to_string());
        map.insert("children".to_string(), self.children.to_string());
        map.insert("subtotal".to_string(), format!("{:.2}", self.quote.subtotal));
        map.insert(
            "discount".to_string(),
            format!("{:.2}", self.quote.discount_amount),
        );
        map.insert("total".to_string(), format!("{:.2}", self.quote.final_total));
        map.insert(
            "deposit".to_string(),
            format!("{:.2}", self.quote.deposit_amount),
        );
        map.insert("customer_name".to_string(), self.customer_name.clone());
        map.insert("customer_email".to_string(), self.customer_email.clone());
        if let Some(code) = &self.promo_code {
            map.insert("promo_code".to_string(), code.clone());
        }
        if let Some(phone) = &self.customer_phone {
            map.insert("customer_phone".to_string(), phone.clone());
        }
        if let Some(notes) = &self.notes {
            map.insert("notes".to_string(), notes.clone());
        }
        map
    }
}

/// Purchase details recovered from a provider session. The inverse of
/// [`CheckoutIntent::metadata`], parsed leniently: a missing party count or
/// amount degrades to zero rather than losing the payment confirmation.
#[derive(Debug, Clone)]
pub struct SessionMetadata {
    pub kind: ExperienceKind,
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub total_usd: f64,
    pub deposit_usd: f64,
    pub promo_code: Option<String>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

impl SessionMetadata {
    /// `None` when the map is not one of ours (no slug) or carries no usable
    /// trip date.
    pub fn from_map(map: &HashMap<String, String>) -> Option<Self> {
        let slug = map.get("experience_slug")?.clone();
        let kind = map
            .get("experience_type")
            .and_then(|v| ExperienceKind::parse(v))
            .unwrap_or(ExperienceKind::Tour);
        let title = map.get("experience_title").cloned().unwrap_or_else(|| slug.clone());
        let date = map
            .get("date")
            .and_then(|v| v.parse::<NaiveDate>().ok())?;

        let parse_u32 = |key: &str| map.get(key).and_then(|v| v.parse::<u32>().ok()).unwrap_or(0);
        let parse_usd = |key: &str| map.get(key).and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);

        Some(Self {
            kind,
            slug,
            title,
            date,
            adults: parse_u32("adults"),
            children: parse_u32("children"),
            total_usd: parse_usd("total"),
            deposit_usd: parse_usd("deposit"),
            promo_code: map.get("promo_code").cloned(),
            customer_name: map.get("customer_name").cloned().unwrap_or_default(),
            customer_email: map.get("customer_email").cloned(),
            customer_phone: map.get("customer_phone").cloned(),
            notes: map.get("notes").cloned(),
        })
    }

    /// Build the durable booking record for a paid session. `charged_usd`,
    /// when the provider reports it, overrides the metadata deposit: the
    /// provider amount is ground truth for what was actually charged.
    pub fn into_booking(
        self,
        session_id: &str,
        customer_email: String,
        charged_usd: Option<f64>,
        source: &str,
    ) -> BookingRecord {
        let deposit_usd = round_usd(charged_usd.unwrap_or(self.deposit_usd));
        let balance_usd = round_usd((self.total_usd - deposit_usd).max(0.0));

        BookingRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            kind: self.kind,
            experience_slug: self.slug,
            experience_title: self.title,
            date: self.date,
            adults: self.adults,
            children: self.children,
            total_usd: self.total_usd,
            deposit_usd,
            balance_usd,
            promo_code: self.promo_code,
            customer_name: self.customer_name,
            customer_email,
            customer_phone: self.customer_phone,
            notes: self.notes,
            status: BookingStatus::Confirmed,
            payment_status: Some("deposit_paid".to_string()),
            created_at: chrono::Utc::now(),
            source: source.to_string(),
        }
    }
}

/// A hosted payment page opened with a provider.
#[derive(Debug, Clone)]
pub struct HostedSession {
    pub provider_session_id: String,
    /// Absent for providers whose checkout is embedded client-side.
    pub redirect_url: Option<String>,
}

/// The two payment flows behind one seam: each fixes its own deposit rate and
/// knows how to open a self-describing hosted session.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Fraction of the trip total charged at booking time for this flow.
    fn deposit_rate(&self) -> f64;

    async fn open_session(&self, intent: &CheckoutIntent) -> Result<HostedSession, GatewayError>;
}
