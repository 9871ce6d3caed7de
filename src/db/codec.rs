//! Conversions between typed models and stored documents.
//!
//! Models carry their `_id` as a 24-character hex string so they serialize
//! cleanly to JSON; stored documents keep a real `ObjectId`.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::DbError;
use crate::error::ServiceError;

pub fn parse_object_id(id: &str) -> Result<ObjectId, ServiceError> {
    ObjectId::parse_str(id).map_err(|_| ServiceError::invalid_id(id))
}

/// Serialize a model, turning a hex `_id` back into an `ObjectId`.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, ServiceError> {
    let mut doc = bson::to_document(value).map_err(DbError::from)?;
    if let Some(Bson::String(hex)) = doc.get("_id") {
        let oid = parse_object_id(hex)?;
        doc.insert("_id", oid);
    }
    Ok(doc)
}

/// Deserialize a stored document, exposing its `ObjectId` as hex.
pub fn from_document<T: DeserializeOwned>(mut doc: Document) -> Result<T, DbError> {
    if let Some(Bson::ObjectId(oid)) = doc.get("_id") {
        let hex = oid.to_hex();
        doc.insert("_id", hex);
    }
    Ok(bson::from_document(doc)?)
}

/// Creation time embedded in a stored document's `ObjectId`.
pub fn created_at(doc: &Document) -> Option<DateTime<Utc>> {
    match doc.get("_id") {
        Some(Bson::ObjectId(oid)) => {
            DateTime::from_timestamp_millis(oid.timestamp().timestamp_millis())
        }
        _ => None,
    }
}

pub fn id_to_hex(id: &Bson) -> Option<String> {
    match id {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        _ => None,
    }
}
