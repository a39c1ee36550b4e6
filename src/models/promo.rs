use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromoKind {
    Percent,
    Fixed,
}

/// A marketing promo code. Created and deactivated by the admin console;
/// read-only everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Stored trimmed and lowercased; lookups normalize before querying.
    pub code: String,
    #[serde(rename = "type")]
    pub kind: PromoKind,
    /// Percent of the subtotal for `percent`, USD amount for `fixed`.
    pub value: f64,
    pub active: bool,
}
