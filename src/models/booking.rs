use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::experience::ExperienceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// A completed deposit payment, written exactly once per provider session.
/// Consumed downstream by CRM, finance and reminder features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: String,
    /// Provider checkout-session or order id. Correlates 1:1 with the payment
    /// and is the idempotency key for writes.
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: ExperienceKind,
    pub experience_slug: String,
    pub experience_title: String,
    pub date: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub total_usd: f64,
    pub deposit_usd: f64,
    /// Always `max(0, total - deposit)`; collected on arrival.
    pub balance_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Which payment flow produced this record ("stripe" or "razorpay").
    pub source: String,
}

/// Administrative mutation of an existing record. Absent fields are left
/// untouched.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
