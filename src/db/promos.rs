use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use super::StoreError;
use crate::models::promo::PromoCode;
use crate::services::promo_service::PromoService;

/// The promo registry. Codes are maintained by the admin console; the booking
/// flow only reads them.
#[async_trait]
pub trait PromoRepository: Send + Sync {
    /// Look up a code. `code` must already be normalized (trimmed,
    /// lowercased), matching how codes are stored.
    async fn find_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError>;
}

pub struct MongoPromos {
    collection: Collection<PromoCode>,
}

impl MongoPromos {
    pub fn new(client: &Client) -> Self {
        Self {
            collection: client.database("Marketing").collection("PromoCodes"),
        }
    }
}

#[async_trait]
impl PromoRepository for MongoPromos {
    async fn find_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError> {
        Ok(self.collection.find_one(doc! { "code": code }).await?)
    }
}

/// In-memory registry used by tests.
#[derive(Default)]
pub struct MemoryPromos {
    codes: Vec<PromoCode>,
}

impl MemoryPromos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut promo: PromoCode) {
        promo.code = PromoService::normalize_code(&promo.code);
        self.codes.push(promo);
    }
}

#[async_trait]
impl PromoRepository for MemoryPromos {
    async fn find_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError> {
        Ok(self.codes.iter().find(|p| p.code == code).cloned())
    }
}
