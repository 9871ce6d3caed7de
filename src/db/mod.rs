pub mod codec;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use std::sync::Arc;
use thiserror::Error;

use crate::config::StorageConfig;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("Failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Duplicate key: _id {0} already exists")]
    DuplicateKey(String),
}

/// Sort and paging applied to a `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl FindOptions {
    pub fn sorted(sort: Document) -> Self {
        Self {
            sort: (!sort.is_empty()).then_some(sort),
            ..Self::default()
        }
    }

    /// Skip `page_idx * page_size` documents and return at most `page_size`.
    ///
    /// `None` when the offset does not fit the store's signed 64-bit skip.
    pub fn page(mut self, page_idx: u64, page_size: u64) -> Option<Self> {
        let skip = page_idx.checked_mul(page_size)?;
        i64::try_from(skip).ok()?;
        self.skip = Some(skip);
        self.limit = Some(i64::try_from(page_size).ok()?);
        Some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// A named collection of documents.
///
/// Filters and update operators follow MongoDB query syntax.
#[async_trait]
pub trait Collection: Send + Sync {
    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, DbError>;

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, DbError>;

    /// Insert a document and return its `_id`, assigning one when absent.
    async fn insert_one(&self, doc: Document) -> Result<Bson, DbError>;

    async fn update_one(&self, filter: Document, update: Document)
    -> Result<UpdateOutcome, DbError>;

    /// Delete the first matching document and return the deleted count.
    async fn delete_one(&self, filter: Document) -> Result<u64, DbError>;
}

pub trait DocumentStore: Send + Sync {
    fn collection(&self, name: &str) -> Arc<dyn Collection>;
}

/// Open the document store described by the configuration.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>, DbError> {
    match config {
        StorageConfig::Mongo { url, database } => {
            Ok(Arc::new(MongoStore::connect(url, database).await?))
        }
        StorageConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
