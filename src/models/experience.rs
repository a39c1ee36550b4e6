use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two bookable catalog shapes. Tours are single outings, packages are
/// multi-day bundles; pricing treats them identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceKind {
    Tour,
    Package,
}

impl ExperienceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tour" => Some(ExperienceKind::Tour),
            "package" => Some(ExperienceKind::Package),
            _ => None,
        }
    }
}

impl fmt::Display for ExperienceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperienceKind::Tour => write!(f, "tour"),
            ExperienceKind::Package => write!(f, "package"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Stable unique key used in URLs and in session metadata.
    pub slug: String,
    pub title: String,
    /// Per-adult price in USD. Children are charged at half this rate.
    pub price_per_person: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
