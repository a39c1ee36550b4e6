pub mod catalog;
pub mod ledger;
pub mod mongo;
pub mod promos;

/// Failures from any backing store (Mongo or the in-process mirror).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),
}
