use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use super::StoreError;
use crate::models::experience::{Experience, ExperienceKind};

/// Read-through access to the bookable catalog. Content management happens
/// elsewhere; the booking flow only ever resolves slugs.
#[async_trait]
pub trait ExperienceRepository: Send + Sync {
    /// Resolve a slug across tours and packages.
    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<(ExperienceKind, Experience)>, StoreError>;
}

pub struct MongoCatalog {
    tours: Collection<Experience>,
    packages: Collection<Experience>,
}

impl MongoCatalog {
    pub fn new(client: &Client) -> Self {
        let db = client.database("Catalog");
        Self {
            tours: db.collection("Tours"),
            packages: db.collection("Packages"),
        }
    }
}

#[async_trait]
impl ExperienceRepository for MongoCatalog {
    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<(ExperienceKind, Experience)>, StoreError> {
        if let Some(tour) = self.tours.find_one(doc! { "slug": slug }).await? {
            return Ok(Some((ExperienceKind::Tour, tour)));
        }
        if let Some(package) = self.packages.find_one(doc! { "slug": slug }).await? {
            return Ok(Some((ExperienceKind::Package, package)));
        }
        Ok(None)
    }
}

/// In-memory catalog used by tests.
#[derive(Default)]
pub struct MemoryCatalog {
    entries: Vec<(ExperienceKind, Experience)>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ExperienceKind, experience: Experience) {
        self.entries.push((kind, experience));
    }
}

#[async_trait]
impl ExperienceRepository for MemoryCatalog {
    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<(ExperienceKind, Experience)>, StoreError> {
        Ok(self
            .entries
            .iter()
            .find(|(_, e)| e.slug == slug)
            .map(|(kind, e)| (*kind, e.clone())))
    }
}
