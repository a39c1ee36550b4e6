use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};
use std::sync::{Arc, Mutex};

use super::StoreError;
use crate::models::booking::{BookingPatch, BookingRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    /// A record with the same session id already exists; nothing was written.
    DuplicateSession,
}

/// The durable store of completed bookings. Mutation is append-or-patch-by-id
/// only, never reordering, so concurrent readers stay safe.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Insert unless a record for the same provider session already exists.
    /// This is the idempotency primitive both confirmation paths rely on, so
    /// implementations must make the check-and-insert atomic.
    async fn append_if_absent(&self, record: BookingRecord) -> Result<AppendOutcome, StoreError>;

    async fn read_all(&self) -> Result<Vec<BookingRecord>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<BookingRecord>, StoreError>;

    async fn find_by_session(&self, session_id: &str)
        -> Result<Option<BookingRecord>, StoreError>;

    /// Apply an administrative patch; returns the updated record, or `None`
    /// when no record has that id.
    async fn update_by_id(
        &self,
        id: &str,
        patch: BookingPatch,
    ) -> Result<Option<BookingRecord>, StoreError>;
}

pub struct MongoLedger {
    collection: Collection<BookingRecord>,
}

impl MongoLedger {
    pub fn new(client: &Client) -> Self {
        Self {
            collection: client.database("Bookings").collection("Records"),
        }
    }
}

#[async_trait]
impl BookingLedger for MongoLedger {
    async fn append_if_absent(&self, record: BookingRecord) -> Result<AppendOutcome, StoreError> {
        // Single server-side op: the upsert either creates the document or
        // matches the existing one, never both.
        let filter = doc! { "session_id": &record.session_id };
        let update = doc! { "$setOnInsert": mongodb::bson::to_document(&record)? };
        let result = self
            .collection
            .update_one(filter, update)
            .upsert(true)
            .await?;

        if result.upserted_id.is_some() {
            Ok(AppendOutcome::Inserted)
        } else {
            Ok(AppendOutcome::DuplicateSession)
        }
    }

    async fn read_all(&self) -> Result<Vec<BookingRecord>, StoreError> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BookingRecord>, StoreError> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<BookingRecord>, StoreError> {
        Ok(self
            .collection
            .find_one(doc! { "session_id": session_id })
            .await?)
    }

    async fn update_by_id(
        &self,
        id: &str,
        patch: BookingPatch,
    ) -> Result<Option<BookingRecord>, StoreError> {
        let mut set = doc! {};
        if let Some(status) = &patch.status {
            set.insert("status", mongodb::bson::to_bson(status)?);
        }
        if let Some(payment_status) = &patch.payment_status {
            set.insert("payment_status", payment_status);
        }
        if let Some(notes) = &patch.notes {
            set.insert("notes", notes);
        }
        if set.is_empty() {
            return self.find_by_id(id).await;
        }

        Ok(self
            .collection
            .find_one_and_update(doc! { "id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }
}

/// In-process ledger. Serves as the fast mirror in front of Mongo and as the
/// ledger for tests.
#[derive(Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<BookingRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn apply_patch(record: &mut BookingRecord, patch: BookingPatch) {
    if let Some(status) = patch.status {
        record.status = status;
    }
    if let Some(payment_status) = patch.payment_status {
        record.payment_status = Some(payment_status);
    }
    if let Some(notes) = patch.notes {
        record.notes = Some(notes);
    }
}

#[async_trait]
impl BookingLedger for MemoryLedger {
    async fn append_if_absent(&self, record: BookingRecord) -> Result<AppendOutcome, StoreError> {
        // Check and push under one guard.
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.session_id == record.session_id) {
            return Ok(AppendOutcome::DuplicateSession);
        }
        records.push(record);
        Ok(AppendOutcome::Inserted)
    }

    async fn read_all(&self) -> Result<Vec<BookingRecord>, StoreError> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BookingRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<BookingRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned())
    }

    async fn update_by_id(
        &self,
        id: &str,
        patch: BookingPatch,
    ) -> Result<Option<BookingRecord>, StoreError> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                apply_patch(record, patch);
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }
}

/// A durable store mirrored by a secondary one. The durable side is
/// authoritative: its result decides every call, and the secondary is written
/// best-effort with failures logged. Reads fall back to the mirror only when
/// the durable store errors.
pub struct MirroredLedger {
    durable: Arc<dyn BookingLedger>,
    mirror: Arc<dyn BookingLedger>,
}

impl MirroredLedger {
    pub fn new(durable: Arc<dyn BookingLedger>, mirror: Arc<dyn BookingLedger>) -> Self {
        Self { durable, mirror }
    }
}

#[async_trait]
impl BookingLedger for MirroredLedger {
    async fn append_if_absent(&self, record: BookingRecord) -> Result<AppendOutcome, StoreError> {
        let outcome = self.durable.append_if_absent(record.clone()).await?;
        if let Err(e) = self.mirror.append_if_absent(record).await {
            log::warn!("booking mirror write failed (durable copy is intact): {}", e);
        }
        Ok(outcome)
    }

    async fn read_all(&self) -> Result<Vec<BookingRecord>, StoreError> {
        match self.durable.read_all().await {
            Ok(records) => Ok(records),
            Err(e) => {
                log::warn!("durable ledger read failed, serving mirrored bookings: {}", e);
                self.mirror.read_all().await
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BookingRecord>, StoreError> {
        match self.durable.find_by_id(id).await {
            Ok(record) => Ok(record),
            Err(e) => {
                log::warn!("durable ledger read failed, serving mirrored booking: {}", e);
                self.mirror.find_by_id(id).await
            }
        }
    }

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<BookingRecord>, StoreError> {
        match self.durable.find_by_session(session_id).await {
            Ok(record) => Ok(record),
            Err(e) => {
                log::warn!("durable ledger read failed, serving mirrored booking: {}", e);
                self.mirror.find_by_session(session_id).await
            }
        }
    }

    async fn update_by_id(
        &self,
        id: &str,
        patch: BookingPatch,
    ) -> Result<Option<BookingRecord>, StoreError> {
        let updated = self.durable.update_by_id(id, patch.clone()).await?;
        if let Err(e) = self.mirror.update_by_id(id, patch).await {
            log::warn!("booking mirror update failed (durable copy is intact): {}", e);
        }
        Ok(updated)
    }
}
