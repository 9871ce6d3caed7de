use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::{Client, Database};
use std::sync::Arc;
use tracing::debug;

use super::{Collection, DbError, DocumentStore, FindOptions, UpdateOutcome};

/// MongoDB-backed document store.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(url: &str, database: &str) -> Result<Self, DbError> {
        let client = Client::with_uri_str(url).await?;
        debug!(database, "Connected to MongoDB");
        Ok(Self {
            db: client.database(database),
        })
    }
}

impl DocumentStore for MongoStore {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        Arc::new(MongoCollection {
            inner: self.db.collection::<Document>(name),
        })
    }
}

struct MongoCollection {
    inner: mongodb::Collection<Document>,
}

#[async_trait]
impl Collection for MongoCollection {
    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, DbError> {
        let mut find = self.inner.find(filter);
        if let Some(sort) = options.sort {
            find = find.sort(sort);
        }
        if let Some(skip) = options.skip {
            find = find.skip(skip);
        }
        if let Some(limit) = options.limit {
            find = find.limit(limit);
        }

        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, DbError> {
        Ok(self.inner.find_one(filter).await?)
    }

    async fn insert_one(&self, doc: Document) -> Result<Bson, DbError> {
        let result = self.inner.insert_one(doc).await?;
        Ok(result.inserted_id)
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, DbError> {
        let result = self.inner.update_one(filter, update).await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, DbError> {
        let result = self.inner.delete_one(filter).await?;
        Ok(result.deleted_count)
    }
}
